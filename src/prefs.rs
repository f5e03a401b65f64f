use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;

use crate::models::theme::ThemeChoice;

const THEME_KEY: &str = "theme";

/// Local key-value preferences, persisted as one flat JSON object.
///
/// The whole map is rewritten on every set, through a sibling temp file
/// that is renamed into place. Reads go to disk so an edit made while the
/// server runs is picked up.
#[derive(Clone)]
pub struct PrefsStore {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl PrefsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn read_map(&self) -> anyhow::Result<BTreeMap<String, String>> {
        match tokio::fs::read(self.path.as_path()).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Corrupt preferences file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e).context("Failed to read preferences"),
        }
    }

    pub async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.read_map().await?.remove(key))
    }

    pub async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = match self.read_map().await {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable preferences");
                BTreeMap::new()
            }
        };
        map.insert(key.to_string(), value.to_string());

        let bytes = serde_json::to_vec_pretty(&map)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, self.path.as_path())
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    /// Pink unless a valid theme is stored.
    pub async fn get_theme(&self) -> anyhow::Result<ThemeChoice> {
        Ok(ThemeChoice::resolve(self.get(THEME_KEY).await?.as_deref()))
    }

    pub async fn set_theme(&self, theme: ThemeChoice) -> anyhow::Result<()> {
        self.set(THEME_KEY, theme.as_str()).await
    }
}

#[cfg(test)]
pub mod testing {
    use super::PrefsStore;

    /// A store under the system temp dir that no other test shares.
    pub fn temp_prefs() -> PrefsStore {
        let path = std::env::temp_dir().join(format!("feelzy-prefs-{}.json", uuid::Uuid::new_v4()));
        PrefsStore::new(path)
    }
}
