use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

/// Whatever bearer token the caller sent, if any. Absence is not an error
/// here; the view controller decides what an unauthenticated view may do.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

pub async fn capture_bearer(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = bearer
        .map(|TypedHeader(auth)| auth.token().to_string())
        .filter(|t| !t.is_empty());

    req.extensions_mut().insert(BearerToken(token));
    next.run(req).await
}
