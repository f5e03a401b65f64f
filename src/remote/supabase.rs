use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{AuthBackend, MoodBackend, RemoteError};
use crate::config::SupabaseSettings;
use crate::models::mood::{MoodEntry, MoodSymbol};
use crate::models::session::{Session, SignUpOutcome};

/// Client for a hosted Supabase project: GoTrue for auth, PostgREST for rows.
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    anon_key: String,
    moods_table: String,
    friends_table: String,
}

/// Row shape of the moods table.
#[derive(Debug, Serialize, Deserialize)]
struct MoodRow {
    user_id: Uuid,
    date: NaiveDate,
    mood: MoodSymbol,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<&MoodEntry> for MoodRow {
    fn from(e: &MoodEntry) -> Self {
        Self {
            user_id: e.author_id,
            date: e.day,
            mood: e.mood,
            note: e.note.clone(),
            created_at: e.created_at,
        }
    }
}

impl From<MoodRow> for MoodEntry {
    fn from(r: MoodRow) -> Self {
        Self {
            author_id: r.user_id,
            day: r.date,
            mood: r.mood,
            note: r.note,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FriendRow {
    friend_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    user: GoTrueUser,
}

/// GoTrue and PostgREST disagree on where the message lives.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message)
    }
}

/// Which Supabase surface a response came from. Only GoTrue words its
/// refusals for the end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Api {
    Auth,
    Rest,
}

fn classify(api: Api, status: u16, message: String) -> RemoteError {
    match (api, status) {
        (Api::Auth, 400 | 401 | 422) => RemoteError::Rejected(message),
        _ => RemoteError::Status { status, message },
    }
}

async fn error_from(api: Api, response: Response) -> RemoteError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or(body);

    classify(api, status, message)
}

async fn ensure_success(api: Api, response: Response) -> Result<Response, RemoteError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from(api, response).await)
    }
}

fn in_filter(ids: &[Uuid]) -> String {
    let joined = ids
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({})", joined)
}

impl SupabaseClient {
    pub fn new(settings: &SupabaseSettings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            anon_key: settings.anon_key.clone(),
            moods_table: settings.moods_table.clone(),
            friends_table: settings.friends_table.clone(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Every call carries the project key; `token` is the user's JWT when
    /// there is one, else the anon key.
    fn authorized(&self, builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }

    async fn select_moods(
        &self,
        token: &str,
        user_filter: String,
    ) -> Result<Vec<MoodEntry>, RemoteError> {
        let request = self.http.get(self.rest_url(&self.moods_table)).query(&[
            ("select", "user_id,date,mood,note,created_at".to_string()),
            ("user_id", user_filter),
            ("order", "created_at.desc".to_string()),
        ]);

        let response = self.authorized(request, Some(token)).send().await?;
        let response = ensure_success(Api::Rest, response).await?;
        let rows: Vec<MoodRow> = serde_json::from_slice(&response.bytes().await?)?;
        Ok(rows.into_iter().map(MoodEntry::from).collect())
    }
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn resolve_session(&self, token: &str) -> Result<Option<Session>, RemoteError> {
        let request = self.http.get(self.auth_url("user"));
        let response = self.authorized(request, Some(token)).send().await?;

        // An expired or revoked JWT just means nobody is signed in.
        if matches!(response.status().as_u16(), 401 | 403) {
            return Ok(None);
        }

        let response = ensure_success(Api::Auth, response).await?;
        let user: GoTrueUser = serde_json::from_slice(&response.bytes().await?)?;
        Ok(Some(Session {
            user_id: user.id,
            email: user.email.unwrap_or_default(),
            access_token: token.to_string(),
        }))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RemoteError> {
        let request = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        let response = self.authorized(request, None).send().await?;
        let response = ensure_success(Api::Auth, response).await?;
        let session: GoTrueSession = serde_json::from_slice(&response.bytes().await?)?;
        Ok(Session {
            user_id: session.user.id,
            email: session.user.email.unwrap_or_else(|| email.to_string()),
            access_token: session.access_token,
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, RemoteError> {
        let request = self
            .http
            .post(self.auth_url("signup"))
            .json(&json!({ "email": email, "password": password }));

        let response = self.authorized(request, None).send().await?;
        ensure_success(Api::Auth, response).await?;
        Ok(SignUpOutcome::ConfirmationPending)
    }

    async fn sign_out(&self, token: &str) -> Result<(), RemoteError> {
        let request = self.http.post(self.auth_url("logout"));
        let response = self.authorized(request, Some(token)).send().await?;
        ensure_success(Api::Auth, response).await?;
        Ok(())
    }
}

#[async_trait]
impl MoodBackend for SupabaseClient {
    async fn insert_mood_entry(&self, token: &str, entry: &MoodEntry) -> Result<(), RemoteError> {
        let request = self
            .http
            .post(self.rest_url(&self.moods_table))
            .query(&[("on_conflict", "user_id,date")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&MoodRow::from(entry));

        let response = self.authorized(request, Some(token)).send().await?;
        ensure_success(Api::Rest, response).await?;
        Ok(())
    }

    async fn query_mood_entries(
        &self,
        token: &str,
        author_id: Uuid,
    ) -> Result<Vec<MoodEntry>, RemoteError> {
        self.select_moods(token, format!("eq.{}", author_id)).await
    }

    async fn query_accepted_friend_ids(
        &self,
        token: &str,
        author_id: Uuid,
    ) -> Result<Vec<Uuid>, RemoteError> {
        let request = self.http.get(self.rest_url(&self.friends_table)).query(&[
            ("select", "friend_id".to_string()),
            ("user_id", format!("eq.{}", author_id)),
            ("status", "eq.accepted".to_string()),
        ]);

        let response = self.authorized(request, Some(token)).send().await?;
        let response = ensure_success(Api::Rest, response).await?;
        let rows: Vec<FriendRow> = serde_json::from_slice(&response.bytes().await?)?;
        Ok(rows.into_iter().map(|r| r.friend_id).collect())
    }

    async fn query_mood_entries_for(
        &self,
        token: &str,
        author_ids: &[Uuid],
    ) -> Result<Vec<MoodEntry>, RemoteError> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select_moods(token, in_filter(author_ids)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SupabaseSettings {
        SupabaseSettings {
            url: "https://project.supabase.co/".into(),
            anon_key: "anon".into(),
            moods_table: "moods".into(),
            friends_table: "friends".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let client = SupabaseClient::new(&settings()).unwrap();
        assert_eq!(
            client.auth_url("user"),
            "https://project.supabase.co/auth/v1/user"
        );
        assert_eq!(
            client.rest_url("moods"),
            "https://project.supabase.co/rest/v1/moods"
        );
    }

    #[test]
    fn test_only_auth_refusals_are_rejections() {
        let rejected = classify(Api::Auth, 400, "Invalid login credentials".into());
        assert!(matches!(rejected, RemoteError::Rejected(ref m) if m == "Invalid login credentials"));

        for status in [401, 403] {
            let err = classify(Api::Rest, status, "JWT expired".into());
            assert!(matches!(err, RemoteError::Status { status: s, .. } if s == status));
        }
        assert!(matches!(
            classify(Api::Auth, 500, "down".into()),
            RemoteError::Status { status: 500, .. }
        ));
    }

    #[test]
    fn test_in_filter_format() {
        let a = Uuid::nil();
        let b = Uuid::from_u128(1);
        assert_eq!(
            in_filter(&[a, b]),
            format!("in.({},{})", a, b)
        );
    }

    #[test]
    fn test_mood_row_decodes_postgrest_json() {
        let raw = r#"[{"user_id":"00000000-0000-0000-0000-000000000000","date":"2026-02-09","mood":"😡","note":null,"created_at":"2026-02-09T10:00:00+00:00"}]"#;
        let rows: Vec<MoodRow> = serde_json::from_str(raw).unwrap();
        let entry = MoodEntry::from(rows.into_iter().next().unwrap());
        assert_eq!(entry.mood, MoodSymbol::Angry);
        assert_eq!(entry.day, NaiveDate::from_ymd_opt(2026, 2, 9).unwrap());
        assert_eq!(entry.note, None);
    }

    #[test]
    fn test_error_body_prefers_description() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid login credentials"));
    }
}
