//! # Feelzy: Request/Response DTOs
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body or query params
//! - `*Response` → serialized to client JSON
//! - Validation is presence only, via `validator` derives

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::controller::HomeFeeds;
use crate::models::mood::{CalendarCell, FriendLatestMood, MoodEntry, MoodSymbol};
use crate::models::session::SessionUser;
use crate::models::theme::ThemeChoice;

pub const EMPTY_HISTORY_NOTICE: &str = "No moods saved yet. Pick one above to get started 👆";
pub const EMPTY_FRIENDS_NOTICE: &str = "None of your friends have shared a mood yet.";
pub const HISTORY_UNAVAILABLE_NOTICE: &str = "Couldn't load your moods right now. Try again in a moment.";
pub const FRIENDS_UNAVAILABLE_NOTICE: &str = "Couldn't load your friends' moods right now.";
pub const CONFIRM_EMAIL_NOTICE: &str = "Check your email to confirm sign up";

// ============================================================================
// Auth
// ============================================================================

/// POST /api/auth/signin
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /api/auth/signup
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    /// Always `confirmation_pending`; whether the account can sign in before
    /// confirming is up to the auth backend.
    pub status: &'static str,
    pub message: &'static str,
}

// ============================================================================
// Home
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: ThemeChoice,
    pub label: &'static str,
}

impl From<ThemeChoice> for ThemeResponse {
    fn from(theme: ThemeChoice) -> Self {
        Self {
            theme,
            label: theme.label(),
        }
    }
}

/// Empty or unavailable feeds are not errors; they come with a line to
/// show instead.
#[derive(Debug, Serialize, Default)]
pub struct Notices {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friends: Option<&'static str>,
}

impl Notices {
    pub fn for_feeds(feeds: &HomeFeeds) -> Self {
        let history = if feeds.history_unavailable {
            Some(HISTORY_UNAVAILABLE_NOTICE)
        } else {
            feeds.history.is_empty().then_some(EMPTY_HISTORY_NOTICE)
        };
        let friends = if feeds.friends_unavailable {
            Some(FRIENDS_UNAVAILABLE_NOTICE)
        } else {
            feeds.friends.is_empty().then_some(EMPTY_FRIENDS_NOTICE)
        };
        Self { history, friends }
    }
}

/// GET /api/home
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub user: SessionUser,
    pub theme: ThemeResponse,
    pub moods: Vec<MoodSymbol>,
    pub history: Vec<MoodEntry>,
    pub friends: Vec<FriendLatestMood>,
    pub calendar: Vec<CalendarCell>,
    pub notices: Notices,
}

// ============================================================================
// Moods
// ============================================================================

/// POST /api/moods
#[derive(Debug, Deserialize)]
pub struct SaveMoodRequest {
    pub mood: Option<MoodSymbol>,
    pub note: Option<String>,
}

/// GET /api/friends
#[derive(Debug, Serialize)]
pub struct FriendsResponse {
    pub friends: Vec<FriendLatestMood>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SaveMoodResponse {
    pub entry: MoodEntry,
    pub history: Vec<MoodEntry>,
}

/// GET /api/moods?date=YYYY-MM-DD
#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct DayResponse {
    pub date: NaiveDate,
    pub entries: Vec<MoodEntry>,
}

// ============================================================================
// Theme
// ============================================================================

/// PUT /api/theme
#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme: ThemeChoice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_only_for_empty_lists() {
        let notices = Notices::for_feeds(&HomeFeeds::default());
        assert_eq!(notices.history, Some(EMPTY_HISTORY_NOTICE));
        assert_eq!(notices.friends, Some(EMPTY_FRIENDS_NOTICE));

        let json = serde_json::to_value(Notices::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_unavailable_feed_gets_its_own_notice() {
        let feeds = HomeFeeds {
            friends_unavailable: true,
            ..HomeFeeds::default()
        };
        let notices = Notices::for_feeds(&feeds);
        assert_eq!(notices.history, Some(EMPTY_HISTORY_NOTICE));
        assert_eq!(notices.friends, Some(FRIENDS_UNAVAILABLE_NOTICE));
    }

    #[test]
    fn test_sign_in_requires_both_fields() {
        let req = SignInRequest {
            email: String::new(),
            password: "x".into(),
        };
        assert!(req.validate().is_err());

        let req = SignInRequest {
            email: "a@b.c".into(),
            password: "x".into(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_save_request_accepts_missing_mood() {
        let req: SaveMoodRequest = serde_json::from_str(r#"{"note":"hi"}"#).unwrap();
        assert!(req.mood.is_none());
        assert_eq!(req.note.as_deref(), Some("hi"));
    }

    #[test]
    fn test_theme_response_carries_label() {
        let json = serde_json::to_value(ThemeResponse::from(ThemeChoice::Blue)).unwrap();
        assert_eq!(json["theme"], "blue");
        assert_eq!(json["label"], "Calm 🌊");
    }
}
