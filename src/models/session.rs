use serde::Serialize;
use uuid::Uuid;

/// An authenticated session as handed back by the auth backend.
///
/// The access token is the capability every data call is made with; it is
/// only ever serialized in the sign-in response.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
}

impl From<&Session> for SessionUser {
    fn from(s: &Session) -> Self {
        Self {
            id: s.user_id,
            email: s.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpOutcome {
    ConfirmationPending,
}
