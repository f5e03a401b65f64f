//! The remote collaborator: authentication plus mood rows.
//!
//! Everything the service knows about users, sessions, friendships and
//! stored moods comes through these two traits. `SupabaseClient` talks to
//! the hosted backend; `MemoryBackend` keeps it all in-process.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::mood::MoodEntry;
use crate::models::session::{Session, SignUpOutcome};

pub mod memory;
pub mod supabase;

pub use memory::MemoryBackend;
pub use supabase::SupabaseClient;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The backend understood the request and said no (bad credentials,
    /// duplicate sign-up, ...).
    #[error("{0}")]
    Rejected(String),
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `Ok(None)` when the token no longer names a live session.
    async fn resolve_session(&self, token: &str) -> Result<Option<Session>, RemoteError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RemoteError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, RemoteError>;

    async fn sign_out(&self, token: &str) -> Result<(), RemoteError>;
}

#[async_trait]
pub trait MoodBackend: Send + Sync {
    /// Upsert keyed by `(author_id, day)`.
    async fn insert_mood_entry(&self, token: &str, entry: &MoodEntry) -> Result<(), RemoteError>;

    /// Newest first.
    async fn query_mood_entries(
        &self,
        token: &str,
        author_id: Uuid,
    ) -> Result<Vec<MoodEntry>, RemoteError>;

    async fn query_accepted_friend_ids(
        &self,
        token: &str,
        author_id: Uuid,
    ) -> Result<Vec<Uuid>, RemoteError>;

    /// Newest first, across all of `author_ids`.
    async fn query_mood_entries_for(
        &self,
        token: &str,
        author_ids: &[Uuid],
    ) -> Result<Vec<MoodEntry>, RemoteError>;
}
