//! TOML-file settings store.
//!
//! The file is re-read on every query. Records are added and removed by
//! whoever owns the file; a running `serve` process sees the change on the
//! next check without a restart.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{MemorySettingsStore, SettingsRecord, SettingsStore};

/// Settings store reading `[devices.<id>]` tables from a TOML file.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn snapshot(&self) -> anyhow::Result<MemorySettingsStore> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading settings {}", self.path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing settings TOML {}", self.path.display()))
    }
}

impl SettingsStore for FileSettingsStore {
    async fn query(&self, id: &str) -> anyhow::Result<Vec<SettingsRecord>> {
        let snapshot = self.snapshot().await?;
        tracing::debug!(
            path = %self.path.display(),
            devices = snapshot.len(),
            "settings file loaded"
        );
        snapshot.query(id).await
    }
}
