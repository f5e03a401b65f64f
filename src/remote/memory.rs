use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AuthBackend, MoodBackend, RemoteError};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{generate_token, hash_token};
use crate::models::mood::{MoodEntry, MoodSymbol};
use crate::models::session::{Session, SignUpOutcome};

const MIN_PASSWORD_LEN: usize = 6;

pub const DEMO_EMAIL: &str = "demo@feelzy.local";
pub const DEMO_PASSWORD: &str = "feelzy-demo";

/// In-process stand-in for the hosted backend.
///
/// Used for `FEELZY_BACKEND=memory` and throughout the tests. Sessions are
/// kept by token hash, never by raw token.
#[derive(Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    calls: CallCounts,
    fail_writes: AtomicBool,
    fail_auth: AtomicBool,
    fail_friends: AtomicBool,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    sessions: HashMap<String, Uuid>,
    friendships: Vec<(Uuid, Uuid)>,
    entries: Vec<MoodEntry>,
}

struct UserRecord {
    id: Uuid,
    email: String,
    password_hash: String,
}

#[derive(Default)]
struct CallCounts {
    resolve_session: AtomicUsize,
    sign_in: AtomicUsize,
    sign_up: AtomicUsize,
    sign_out: AtomicUsize,
    insert_mood_entry: AtomicUsize,
    query_mood_entries: AtomicUsize,
    query_accepted_friend_ids: AtomicUsize,
    query_mood_entries_for: AtomicUsize,
}

/// Point-in-time copy of how often each operation was called.
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSnapshot {
    pub resolve_session: usize,
    pub sign_in: usize,
    pub sign_up: usize,
    pub sign_out: usize,
    pub insert_mood_entry: usize,
    pub query_mood_entries: usize,
    pub query_accepted_friend_ids: usize,
    pub query_mood_entries_for: usize,
}

#[cfg(test)]
impl CallSnapshot {
    /// Every read a home view would make.
    pub fn feed_calls(&self) -> usize {
        self.query_mood_entries + self.query_accepted_friend_ids + self.query_mood_entries_for
    }

    pub fn total(&self) -> usize {
        self.resolve_session
            + self.sign_in
            + self.sign_up
            + self.sign_out
            + self.insert_mood_entry
            + self.feed_calls()
    }
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn calls(&self) -> CallSnapshot {
        let c = &self.calls;
        CallSnapshot {
            resolve_session: c.resolve_session.load(Ordering::SeqCst),
            sign_in: c.sign_in.load(Ordering::SeqCst),
            sign_up: c.sign_up.load(Ordering::SeqCst),
            sign_out: c.sign_out.load(Ordering::SeqCst),
            insert_mood_entry: c.insert_mood_entry.load(Ordering::SeqCst),
            query_mood_entries: c.query_mood_entries.load(Ordering::SeqCst),
            query_accepted_friend_ids: c.query_accepted_friend_ids.load(Ordering::SeqCst),
            query_mood_entries_for: c.query_mood_entries_for.load(Ordering::SeqCst),
        }
    }

    /// Make every subsequent write fail with a 503.
    #[cfg(test)]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make session resolution and sign-out fail with a 503.
    #[cfg(test)]
    pub fn fail_auth(&self, fail: bool) {
        self.fail_auth.store(fail, Ordering::SeqCst);
    }

    /// Make the friend list query fail with a 500.
    #[cfg(test)]
    pub fn fail_friends(&self, fail: bool) {
        self.fail_friends.store(fail, Ordering::SeqCst);
    }

    fn auth_unavailable(&self) -> Result<(), RemoteError> {
        if self.fail_auth.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 503,
                message: "Auth unavailable".into(),
            });
        }
        Ok(())
    }

    /// Record an accepted friendship in both directions.
    pub async fn befriend(&self, a: Uuid, b: Uuid) {
        let mut inner = self.inner.lock().await;
        inner.friendships.push((a, b));
        inner.friendships.push((b, a));
    }

    /// Store an entry as-is, bypassing upsert. Friends' feeds may hold
    /// several entries per author.
    pub async fn seed_entry(&self, entry: MoodEntry) {
        self.inner.lock().await.entries.push(entry);
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<Uuid, RemoteError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(RemoteError::Rejected(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let key = email.to_lowercase();
        let mut inner = self.inner.lock().await;
        if inner.users.contains_key(&key) {
            return Err(RemoteError::Rejected("User already registered".into()));
        }

        let password_hash = hash_password(password).map_err(|e| RemoteError::Status {
            status: 500,
            message: e.to_string(),
        })?;
        let id = Uuid::new_v4();
        inner.users.insert(
            key,
            UserRecord {
                id,
                email: email.to_string(),
                password_hash,
            },
        );
        Ok(id)
    }

    /// A demo account with two friends and a few days of moods each.
    pub async fn seed_demo(&self) -> anyhow::Result<()> {
        let now = Utc::now();
        let demo = self.create_user(DEMO_EMAIL, DEMO_PASSWORD).await?;

        let friends = [
            ("sam@feelzy.local", [MoodSymbol::Sleepy, MoodSymbol::Happy, MoodSymbol::Loved]),
            ("kai@feelzy.local", [MoodSymbol::Overwhelmed, MoodSymbol::Neutral, MoodSymbol::Crying]),
        ];
        for (email, moods) in friends {
            let friend = self.create_user(email, DEMO_PASSWORD).await?;
            self.befriend(demo, friend).await;
            // Oldest first, so the last mood listed is the latest.
            for (days_ago, mood) in (0..moods.len() as i64).rev().zip(moods) {
                let at = now - Duration::days(days_ago) - Duration::hours(2);
                self.seed_entry(MoodEntry::stamped(friend, mood, None, at)).await;
            }
        }

        let own = [
            (3, MoodSymbol::Neutral, Some("Slow start to the week")),
            (2, MoodSymbol::Happy, None),
            (1, MoodSymbol::Angry, Some("Missed the bus twice")),
        ];
        for (days_ago, mood, note) in own {
            let at = now - Duration::days(days_ago);
            self.seed_entry(MoodEntry::stamped(demo, mood, note.map(String::from), at))
                .await;
        }

        tracing::info!(email = DEMO_EMAIL, password = DEMO_PASSWORD, "Seeded demo account");
        Ok(())
    }

    async fn user_for_token(&self, token: &str) -> Result<Uuid, RemoteError> {
        let inner = self.inner.lock().await;
        inner
            .sessions
            .get(&hash_token(token))
            .copied()
            .ok_or_else(|| RemoteError::Status {
                status: 401,
                message: "Invalid session".into(),
            })
    }
}

fn newest_first(mut entries: Vec<MoodEntry>) -> Vec<MoodEntry> {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries
}

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn resolve_session(&self, token: &str) -> Result<Option<Session>, RemoteError> {
        bump(&self.calls.resolve_session);
        self.auth_unavailable()?;
        let inner = self.inner.lock().await;
        let Some(user_id) = inner.sessions.get(&hash_token(token)).copied() else {
            return Ok(None);
        };
        Ok(inner
            .users
            .values()
            .find(|u| u.id == user_id)
            .map(|u| Session {
                user_id: u.id,
                email: u.email.clone(),
                access_token: token.to_string(),
            }))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RemoteError> {
        bump(&self.calls.sign_in);
        let mut inner = self.inner.lock().await;
        let (user_id, email) = match inner.users.get(&email.to_lowercase()) {
            Some(u) if verify_password(password, &u.password_hash) => (u.id, u.email.clone()),
            _ => return Err(RemoteError::Rejected("Invalid login credentials".into())),
        };

        let token = generate_token();
        inner.sessions.insert(hash_token(&token), user_id);
        tracing::debug!(user_id = %user_id, "Memory backend session issued");

        Ok(Session {
            user_id,
            email,
            access_token: token,
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, RemoteError> {
        bump(&self.calls.sign_up);
        self.create_user(email, password).await?;

        // No mailer here: accounts can sign in straight away.
        Ok(SignUpOutcome::ConfirmationPending)
    }

    async fn sign_out(&self, token: &str) -> Result<(), RemoteError> {
        bump(&self.calls.sign_out);
        self.auth_unavailable()?;
        self.inner.lock().await.sessions.remove(&hash_token(token));
        Ok(())
    }
}

#[async_trait]
impl MoodBackend for MemoryBackend {
    async fn insert_mood_entry(&self, token: &str, entry: &MoodEntry) -> Result<(), RemoteError> {
        bump(&self.calls.insert_mood_entry);
        let user_id = self.user_for_token(token).await?;
        if user_id != entry.author_id {
            return Err(RemoteError::Status {
                status: 403,
                message: "Cannot write another user's mood".into(),
            });
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 503,
                message: "Write unavailable".into(),
            });
        }

        let mut inner = self.inner.lock().await;
        inner
            .entries
            .retain(|e| !(e.author_id == entry.author_id && e.day == entry.day));
        inner.entries.push(entry.clone());
        Ok(())
    }

    async fn query_mood_entries(
        &self,
        token: &str,
        author_id: Uuid,
    ) -> Result<Vec<MoodEntry>, RemoteError> {
        bump(&self.calls.query_mood_entries);
        self.user_for_token(token).await?;
        let inner = self.inner.lock().await;
        Ok(newest_first(
            inner
                .entries
                .iter()
                .filter(|e| e.author_id == author_id)
                .cloned()
                .collect(),
        ))
    }

    async fn query_accepted_friend_ids(
        &self,
        token: &str,
        author_id: Uuid,
    ) -> Result<Vec<Uuid>, RemoteError> {
        bump(&self.calls.query_accepted_friend_ids);
        self.user_for_token(token).await?;
        if self.fail_friends.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 500,
                message: "friends table down".into(),
            });
        }
        let inner = self.inner.lock().await;
        Ok(inner
            .friendships
            .iter()
            .filter(|(user, _)| *user == author_id)
            .map(|(_, friend)| *friend)
            .collect())
    }

    async fn query_mood_entries_for(
        &self,
        token: &str,
        author_ids: &[Uuid],
    ) -> Result<Vec<MoodEntry>, RemoteError> {
        bump(&self.calls.query_mood_entries_for);
        self.user_for_token(token).await?;
        let inner = self.inner.lock().await;
        Ok(newest_first(
            inner
                .entries
                .iter()
                .filter(|e| author_ids.contains(&e.author_id))
                .cloned()
                .collect(),
        ))
    }
}

/// Helpers shared by tests across the crate.
#[cfg(test)]
pub mod testing {
    use super::*;

    pub async fn signed_in(backend: &MemoryBackend, email: &str) -> Session {
        backend.sign_up(email, "password123").await.unwrap();
        backend.sign_in(email, "password123").await.unwrap()
    }
}
