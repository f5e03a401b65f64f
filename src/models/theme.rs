use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    #[default]
    Pink,
    Blue,
    Green,
}

impl ThemeChoice {
    pub const ALL: [ThemeChoice; 3] = [Self::Pink, Self::Blue, Self::Green];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pink => "pink",
            Self::Blue => "blue",
            Self::Green => "green",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pink => "Blush 🌸",
            Self::Blue => "Calm 🌊",
            Self::Green => "Fresh 🍃",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }

    /// Whatever was stored, always land on a valid theme.
    pub fn resolve(stored: Option<&str>) -> Self {
        stored.and_then(Self::parse).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_to_pink() {
        assert_eq!(ThemeChoice::resolve(None), ThemeChoice::Pink);
        assert_eq!(ThemeChoice::resolve(Some("purple")), ThemeChoice::Pink);
        assert_eq!(ThemeChoice::resolve(Some("")), ThemeChoice::Pink);
    }

    #[test]
    fn test_resolve_known_values() {
        assert_eq!(ThemeChoice::resolve(Some("blue")), ThemeChoice::Blue);
        assert_eq!(ThemeChoice::resolve(Some("green")), ThemeChoice::Green);
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_value(ThemeChoice::Green).unwrap();
        assert_eq!(json, serde_json::json!("green"));
    }
}
