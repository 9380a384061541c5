use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Epoch milliseconds of the last fully successful run.
    #[serde(default)]
    pub last_sync_time: i64,
}

#[derive(Debug, Clone)]
pub struct SyncStateStore {
    path: PathBuf,
}

impl SyncStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing state file means nothing has been synced yet.
    pub async fn load(&self) -> Result<SyncState> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SyncState::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read sync state {}", self.path.display()));
            }
        };

        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse sync state {}", self.path.display()))
    }

    pub async fn save(&self, state: &SyncState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let raw = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&self.path, raw)
            .await
            .with_context(|| format!("failed to write sync state {}", self.path.display()))
    }

    /// Forgets the last sync so the next run fetches every highlight again.
    pub async fn reset(&self) -> Result<()> {
        self.save(&SyncState::default()).await
    }
}
