use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{AppError, AppResult};
use crate::models::mood::{MoodEntry, MoodSymbol};
use crate::models::session::Session;
use crate::remote::MoodBackend;

pub const MISSING_MOOD: &str = "Pick a mood before saving";

/// The signed-in user's own mood history.
///
/// The backend is the source of truth: a successful save is followed by a
/// full reload rather than a local patch, and a failed save leaves the
/// in-memory history exactly as it was.
pub struct MoodEntryStore {
    backend: Arc<dyn MoodBackend>,
    history: Vec<MoodEntry>,
}

impl MoodEntryStore {
    pub fn new(backend: Arc<dyn MoodBackend>) -> Self {
        Self {
            backend,
            history: Vec::new(),
        }
    }

    /// Newest first, as last loaded.
    pub fn history(&self) -> &[MoodEntry] {
        &self.history
    }

    pub fn entries_on(&self, day: NaiveDate) -> Vec<&MoodEntry> {
        self.history.iter().filter(|e| e.day == day).collect()
    }

    /// Replace the in-memory history with the backend's rows, verbatim.
    pub async fn load(&mut self, session: &Session) -> AppResult<&[MoodEntry]> {
        let entries = self
            .backend
            .query_mood_entries(&session.access_token, session.user_id)
            .await?;
        self.history = entries;
        Ok(&self.history)
    }

    pub async fn upsert_today(
        &mut self,
        mood: Option<MoodSymbol>,
        note: Option<String>,
        session: Option<&Session>,
    ) -> AppResult<MoodEntry> {
        self.upsert_at(mood, note, session, Utc::now()).await
    }

    async fn upsert_at(
        &mut self,
        mood: Option<MoodSymbol>,
        note: Option<String>,
        session: Option<&Session>,
        now: DateTime<Utc>,
    ) -> AppResult<MoodEntry> {
        let Some(session) = session else {
            return Err(AppError::PreconditionNotMet(
                "Sign in to save your mood".into(),
            ));
        };
        let Some(mood) = mood else {
            return Err(AppError::PreconditionNotMet(MISSING_MOOD.into()));
        };

        let entry = MoodEntry::stamped(session.user_id, mood, note, now);
        self.backend
            .insert_mood_entry(&session.access_token, &entry)
            .await?;

        tracing::info!(
            user_id = %session.user_id,
            day = %entry.day,
            mood = entry.mood.emoji(),
            "Mood saved"
        );

        self.history.retain(|e| e.day != entry.day);
        self.history.insert(0, entry.clone());

        // Read-after-write. The save itself succeeded, so a failed reload
        // keeps the locally replaced history and is only logged.
        if let Err(e) = self.load(session).await {
            tracing::warn!(user_id = %session.user_id, error = %e, "Reload after save failed");
        }

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::testing::signed_in;
    use crate::remote::MemoryBackend;
    use chrono::TimeZone;

    async fn setup() -> (Arc<MemoryBackend>, MoodEntryStore, Session) {
        let backend = Arc::new(MemoryBackend::new());
        let session = signed_in(&backend, "ana@example.com").await;
        let store = MoodEntryStore::new(backend.clone());
        (backend, store, session)
    }

    #[tokio::test]
    async fn test_same_day_resave_replaces() {
        let (_backend, mut store, session) = setup().await;
        let morning = Utc.with_ymd_and_hms(2026, 2, 9, 8, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2026, 2, 9, 21, 0, 0).unwrap();

        store
            .upsert_at(Some(MoodSymbol::Happy), None, Some(&session), morning)
            .await
            .unwrap();
        store
            .upsert_at(Some(MoodSymbol::Angry), Some("traffic".into()), Some(&session), evening)
            .await
            .unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 2, 9).unwrap();
        let on_day = store.entries_on(day);
        assert_eq!(on_day.len(), 1);
        assert_eq!(on_day[0].mood, MoodSymbol::Angry);
        assert_eq!(on_day[0].note.as_deref(), Some("traffic"));
        assert_eq!(store.history().len(), 1);
    }

    #[tokio::test]
    async fn test_history_matches_backend_after_save() {
        let (backend, mut store, session) = setup().await;
        let earlier = Utc.with_ymd_and_hms(2026, 2, 7, 8, 0, 0).unwrap();
        backend
            .seed_entry(MoodEntry::stamped(session.user_id, MoodSymbol::Sleepy, None, earlier))
            .await;

        store
            .upsert_today(Some(MoodSymbol::Neutral), None, Some(&session))
            .await
            .unwrap();

        let remote = backend
            .query_mood_entries(&session.access_token, session.user_id)
            .await
            .unwrap();
        assert_eq!(store.history(), remote.as_slice());
        assert_eq!(store.history().len(), 2);
        assert_eq!(store.history()[0].mood, MoodSymbol::Neutral);
        assert!(backend.calls().query_mood_entries >= 1);
    }

    #[tokio::test]
    async fn test_missing_mood_makes_no_remote_call() {
        let (backend, mut store, session) = setup().await;
        let before = backend.calls();

        let err = store
            .upsert_today(None, Some("meh".into()), Some(&session))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PreconditionNotMet(_)));
        assert_eq!(backend.calls(), before);
    }

    #[tokio::test]
    async fn test_missing_session_makes_no_remote_call() {
        let (backend, mut store, _session) = setup().await;
        let before = backend.calls();

        let err = store
            .upsert_today(Some(MoodSymbol::Happy), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PreconditionNotMet(_)));
        assert_eq!(backend.calls(), before);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_history_untouched() {
        let (backend, mut store, session) = setup().await;
        store
            .upsert_today(Some(MoodSymbol::Happy), None, Some(&session))
            .await
            .unwrap();
        let snapshot = store.history().to_vec();

        backend.fail_writes(true);
        let err = store
            .upsert_today(Some(MoodSymbol::Crying), None, Some(&session))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RemoteOperationFailed(_)));
        assert_eq!(store.history(), snapshot.as_slice());
    }

    #[tokio::test]
    async fn test_load_returns_rows_verbatim() {
        let (backend, mut store, session) = setup().await;
        for day in [3, 5, 4] {
            let at = Utc.with_ymd_and_hms(2026, 2, day, 12, 0, 0).unwrap();
            backend
                .seed_entry(MoodEntry::stamped(session.user_id, MoodSymbol::Loved, None, at))
                .await;
        }

        let loaded = store.load(&session).await.unwrap().to_vec();
        let remote = backend
            .query_mood_entries(&session.access_token, session.user_id)
            .await
            .unwrap();
        assert_eq!(loaded, remote);
    }

    #[tokio::test]
    async fn test_load_empty_is_not_an_error() {
        let (_backend, mut store, session) = setup().await;
        assert!(store.load(&session).await.unwrap().is_empty());
    }
}
