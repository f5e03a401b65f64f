use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MoodSymbol {
    #[serde(rename = "😊")]
    Happy,
    #[serde(rename = "😔")]
    Sad,
    #[serde(rename = "😡")]
    Angry,
    #[serde(rename = "😴")]
    Sleepy,
    #[serde(rename = "😐")]
    Neutral,
    #[serde(rename = "😍")]
    Loved,
    #[serde(rename = "😭")]
    Crying,
    #[serde(rename = "🤯")]
    Overwhelmed,
}

impl MoodSymbol {
    pub const ALL: [MoodSymbol; 8] = [
        Self::Happy,
        Self::Sad,
        Self::Angry,
        Self::Sleepy,
        Self::Neutral,
        Self::Loved,
        Self::Crying,
        Self::Overwhelmed,
    ];

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Happy => "😊",
            Self::Sad => "😔",
            Self::Angry => "😡",
            Self::Sleepy => "😴",
            Self::Neutral => "😐",
            Self::Loved => "😍",
            Self::Crying => "😭",
            Self::Overwhelmed => "🤯",
        }
    }

    /// Background colour token the page uses for cards and calendar cells.
    pub fn colour(&self) -> &'static str {
        match self {
            Self::Happy => "bg-yellow-200",
            Self::Sad => "bg-blue-200",
            Self::Angry => "bg-red-200",
            Self::Sleepy => "bg-purple-200",
            Self::Neutral => "bg-gray-200",
            Self::Loved => "bg-pink-200",
            Self::Crying => "bg-indigo-200",
            Self::Overwhelmed => "bg-orange-200",
        }
    }
}

/// One day's self-reported mood. Own history holds at most one per
/// `(author_id, day)`; friends' feeds make no such promise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoodEntry {
    pub author_id: Uuid,
    pub day: NaiveDate,
    pub mood: MoodSymbol,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MoodEntry {
    /// Stamp a new entry at `now`, using the UTC calendar day.
    pub fn stamped(author_id: Uuid, mood: MoodSymbol, note: Option<String>, now: DateTime<Utc>) -> Self {
        let note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Self {
            author_id,
            day: now.date_naive(),
            mood,
            note,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FriendLatestMood {
    pub author_id: Uuid,
    pub mood: MoodSymbol,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MoodEntry> for FriendLatestMood {
    fn from(e: MoodEntry) -> Self {
        Self {
            author_id: e.author_id,
            mood: e.mood,
            note: e.note,
            created_at: e.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CalendarCell {
    pub day: NaiveDate,
    /// `MM-DD`
    pub label: String,
    pub mood: MoodSymbol,
    pub colour: &'static str,
}

impl From<&MoodEntry> for CalendarCell {
    fn from(e: &MoodEntry) -> Self {
        Self {
            day: e.day,
            label: e.day.format("%m-%d").to_string(),
            mood: e.mood,
            colour: e.mood.colour(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_mood_serializes_as_emoji() {
        let json = serde_json::to_value(MoodSymbol::Overwhelmed).unwrap();
        assert_eq!(json, serde_json::json!("🤯"));
        let back: MoodSymbol = serde_json::from_str("\"😴\"").unwrap();
        assert_eq!(back, MoodSymbol::Sleepy);
    }

    #[test]
    fn test_unknown_emoji_rejected() {
        assert!(serde_json::from_str::<MoodSymbol>("\"🙃\"").is_err());
    }

    #[test]
    fn test_emoji_matches_wire_form() {
        for mood in MoodSymbol::ALL {
            let json = serde_json::to_value(mood).unwrap();
            assert_eq!(json.as_str(), Some(mood.emoji()));
        }
    }

    #[test]
    fn test_every_mood_has_distinct_colour() {
        let mut colours: Vec<_> = MoodSymbol::ALL.iter().map(|m| m.colour()).collect();
        colours.sort();
        colours.dedup();
        assert_eq!(colours.len(), MoodSymbol::ALL.len());
    }

    #[test]
    fn test_stamped_uses_utc_day_and_drops_blank_note() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 0).unwrap();
        let entry = MoodEntry::stamped(Uuid::new_v4(), MoodSymbol::Happy, Some("   ".into()), now);
        assert_eq!(entry.day, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(entry.note, None);
        assert_eq!(entry.created_at, now);
    }

    #[test]
    fn test_calendar_label_is_month_day() {
        let now = Utc.with_ymd_and_hms(2026, 2, 9, 8, 0, 0).unwrap();
        let entry = MoodEntry::stamped(Uuid::new_v4(), MoodSymbol::Sad, None, now);
        let cell = CalendarCell::from(&entry);
        assert_eq!(cell.label, "02-09");
        assert_eq!(cell.colour, "bg-blue-200");
    }
}
