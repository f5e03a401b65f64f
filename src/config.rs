use std::env;
use std::str::FromStr;

use anyhow::{bail, Context};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Supabase,
    Memory,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "supabase" => Ok(Self::Supabase),
            "memory" => Ok(Self::Memory),
            other => bail!("Unknown FEELZY_BACKEND {:?} (expected supabase or memory)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
    pub moods_table: String,
    pub friends_table: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub backend: BackendKind,
    /// Present whenever `backend` is `Supabase`.
    pub supabase: Option<SupabaseSettings>,

    pub prefs_path: String,
    pub sign_in_path: String,

    pub auth_rate_limit_max: u32,
    pub auth_rate_limit_window_secs: u64,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

fn parsed_or<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = var_or(key, default);
    raw.parse()
        .map_err(|e| anyhow::anyhow!("{} must be a number, got {:?}: {}", key, raw, e))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend: BackendKind = var_or("FEELZY_BACKEND", "supabase").parse()?;

        let supabase = match backend {
            BackendKind::Supabase => Some(SupabaseSettings {
                url: env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?,
                anon_key: env::var("SUPABASE_ANON_KEY")
                    .context("SUPABASE_ANON_KEY must be set")?,
                moods_table: var_or("MOODS_TABLE", "moods"),
                friends_table: var_or("FRIENDS_TABLE", "friends"),
                timeout_secs: parsed_or("REMOTE_TIMEOUT_SECS", "30")?,
            }),
            BackendKind::Memory => None,
        };

        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parsed_or("PORT", "8080")?,
            frontend_url: var_or("FRONTEND_URL", "http://localhost:3000"),

            backend,
            supabase,

            prefs_path: var_or("PREFS_PATH", "feelzy-prefs.json"),
            sign_in_path: var_or("SIGN_IN_PATH", "/auth"),

            auth_rate_limit_max: parsed_or("AUTH_RATE_LIMIT_MAX", "5")?,
            auth_rate_limit_window_secs: parsed_or("AUTH_RATE_LIMIT_WINDOW_SECS", "60")?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Memory-backed defaults, used by the router tests.
    #[cfg(test)]
    pub fn for_tests(prefs_path: String) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            backend: BackendKind::Memory,
            supabase: None,
            prefs_path,
            sign_in_path: "/auth".into(),
            auth_rate_limit_max: 5,
            auth_rate_limit_window_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert_eq!("Supabase".parse::<BackendKind>().unwrap(), BackendKind::Supabase);
        assert!("postgres".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_listen_addr() {
        let config = Config::for_tests("prefs.json".into());
        assert_eq!(config.listen_addr(), "127.0.0.1:0");
    }
}
