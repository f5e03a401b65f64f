//! Friends' feed: collapse a newest-first stream of entries down to each
//! author's latest mood.

use std::collections::HashSet;
use std::hash::Hash;

use crate::models::mood::{FriendLatestMood, MoodEntry};
use crate::models::session::Session;
use crate::remote::{MoodBackend, RemoteError};

/// Keep the first record seen for each distinct key, in first-seen order.
///
/// The input must already be sorted newest first; this never sorts. Because
/// the first occurrence wins, records tied on recency resolve in input order.
pub fn latest_per_key<T, K, F>(records: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(key(record)))
        .collect()
}

pub fn friends_latest(entries: Vec<MoodEntry>) -> Vec<FriendLatestMood> {
    latest_per_key(entries, |e| e.author_id)
        .into_iter()
        .map(FriendLatestMood::from)
        .collect()
}

/// Accepted friends of the session's user, then their entries, reduced.
pub async fn fetch_friends_latest(
    backend: &dyn MoodBackend,
    session: &Session,
) -> Result<Vec<FriendLatestMood>, RemoteError> {
    let friend_ids = backend
        .query_accepted_friend_ids(&session.access_token, session.user_id)
        .await?;

    if friend_ids.is_empty() {
        return Ok(Vec::new());
    }

    let entries = backend
        .query_mood_entries_for(&session.access_token, &friend_ids)
        .await?;

    tracing::debug!(
        user_id = %session.user_id,
        friends = friend_ids.len(),
        entries = entries.len(),
        "Loaded friends' feed"
    );

    Ok(friends_latest(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mood::MoodSymbol;
    use crate::remote::memory::testing::signed_in;
    use crate::remote::MemoryBackend;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq)]
    struct Rec {
        author: &'static str,
        t: u32,
        mood: &'static str,
    }

    fn rec(author: &'static str, t: u32, mood: &'static str) -> Rec {
        Rec { author, t, mood }
    }

    #[test]
    fn test_scenario_keeps_latest_per_author() {
        let input = vec![rec("u1", 3, "😀"), rec("u2", 2, "😡"), rec("u1", 1, "😴")];
        let out = latest_per_key(input, |r| r.author);
        assert_eq!(out, vec![rec("u1", 3, "😀"), rec("u2", 2, "😡")]);
    }

    #[test]
    fn test_empty_in_empty_out() {
        let out = latest_per_key(Vec::<Rec>::new(), |r| r.author);
        assert!(out.is_empty());
    }

    #[test]
    fn test_single_key_returns_first() {
        let input = vec![rec("u1", 9, "😊"), rec("u1", 5, "😔"), rec("u1", 1, "😐")];
        let out = latest_per_key(input, |r| r.author);
        assert_eq!(out, vec![rec("u1", 9, "😊")]);
    }

    #[test]
    fn test_ties_resolve_to_first_occurrence() {
        let input = vec![rec("u1", 4, "😍"), rec("u1", 4, "😭")];
        let out = latest_per_key(input, |r| r.author);
        assert_eq!(out, vec![rec("u1", 4, "😍")]);
    }

    #[test]
    fn test_idempotent() {
        let input = vec![
            rec("u3", 8, "😊"),
            rec("u1", 7, "😡"),
            rec("u3", 6, "😴"),
            rec("u2", 5, "😐"),
            rec("u1", 1, "🤯"),
        ];
        let once = latest_per_key(input, |r| r.author);
        let twice = latest_per_key(once.clone(), |r| r.author);
        assert_eq!(once, twice);
        assert_eq!(
            once.iter().map(|r| r.author).collect::<Vec<_>>(),
            vec!["u3", "u1", "u2"]
        );
    }

    #[test]
    fn test_each_kept_record_is_max_for_its_key() {
        let input = vec![
            rec("a", 10, "😊"),
            rec("b", 9, "😔"),
            rec("a", 8, "😡"),
            rec("c", 3, "😴"),
            rec("b", 2, "😐"),
        ];
        let out = latest_per_key(input.clone(), |r| r.author);
        for kept in &out {
            let max = input
                .iter()
                .filter(|r| r.author == kept.author)
                .map(|r| r.t)
                .max()
                .unwrap();
            assert_eq!(kept.t, max);
        }
        assert_eq!(out.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_friends_latest_reduces_feed() {
        let backend = MemoryBackend::new();
        let me = signed_in(&backend, "me@example.com").await;
        let friend = signed_in(&backend, "friend@example.com").await;
        backend.befriend(me.user_id, friend.user_id).await;

        let base = Utc.with_ymd_and_hms(2026, 2, 9, 9, 0, 0).unwrap();
        for (offset, mood) in [(0, MoodSymbol::Sad), (1, MoodSymbol::Loved)] {
            backend
                .seed_entry(MoodEntry::stamped(
                    friend.user_id,
                    mood,
                    None,
                    base + Duration::days(offset),
                ))
                .await;
        }

        let latest = fetch_friends_latest(&backend, &me).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].author_id, friend.user_id);
        assert_eq!(latest[0].mood, MoodSymbol::Loved);
    }

    #[tokio::test]
    async fn test_no_friends_skips_entry_query() {
        let backend = MemoryBackend::new();
        let me = signed_in(&backend, "me@example.com").await;
        backend
            .seed_entry(MoodEntry::stamped(Uuid::new_v4(), MoodSymbol::Happy, None, Utc::now()))
            .await;

        let latest = fetch_friends_latest(&backend, &me).await.unwrap();
        assert!(latest.is_empty());
        assert_eq!(backend.calls().query_mood_entries_for, 0);
    }
}
