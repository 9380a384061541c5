use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::backend::ReadeckBackend;
use crate::config::Config;
use crate::error::{BackendError, SyncError};
use crate::state::{SyncState, SyncStateStore};
use crate::transport::{HttpTransport, Transport};
use crate::vault::NoteVault;

pub enum SyncResult<T> {
    Created(T),
    Updated(T),
}

impl SyncResult<usize> {
    pub fn record(self, stats: &mut SyncStats) {
        match self {
            SyncResult::Created(highlights) => {
                stats.notes_created += 1;
                stats.highlights += highlights;
            }
            SyncResult::Updated(highlights) => {
                stats.notes_updated += 1;
                stats.highlights += highlights;
            }
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncStats {
    pub notes_created: usize,
    pub notes_updated: usize,
    pub highlights: usize,
}

/// Held for the duration of one run; a second run fails fast instead of
/// interleaving with the first.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SyncError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::InProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct Synchronizer<T: Transport> {
    backend: ReadeckBackend<T>,
    vault: NoteVault,
    state: SyncStateStore,
    timeout: Duration,
    in_progress: AtomicBool,
}

impl Synchronizer<HttpTransport> {
    pub fn from_config(cfg: &Config, data_dir: &Path) -> Result<Self, SyncError> {
        cfg.validate()?;

        let timeout = Duration::from_secs(cfg.sync.timeout_seconds);
        let transport = HttpTransport::new(timeout)?;
        let backend = ReadeckBackend::new(transport, &cfg.readeck.url, &cfg.readeck.api_token)
            .with_page_size(cfg.readeck.page_size);

        Ok(Synchronizer::new(
            backend,
            NoteVault::new(cfg.sync_folder(data_dir)),
            SyncStateStore::new(cfg.state_file(data_dir)),
            timeout,
        ))
    }
}

impl<T: Transport> Synchronizer<T> {
    pub fn new(
        backend: ReadeckBackend<T>,
        vault: NoteVault,
        state: SyncStateStore,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            vault,
            state,
            timeout,
            in_progress: AtomicBool::new(false),
        }
    }

    pub async fn check_connection(&self) -> Result<(), BackendError> {
        self.backend.check_connection().await
    }

    pub async fn run(&self) -> Result<SyncStats, SyncError> {
        self.run_until_cancelled(&CancellationToken::new()).await
    }

    /// One full sync: fetch everything newer than the stored timestamp,
    /// write it into the vault, then move the timestamp forward. The stored
    /// timestamp only changes when every step succeeded.
    ///
    /// The timeout and `cancel` only apply to the fetch. Once notes start
    /// being written the run finishes, so no note is appended to without the
    /// timestamp moving past its highlights.
    pub async fn run_until_cancelled(&self, cancel: &CancellationToken) -> Result<SyncStats, SyncError> {
        let _guard = RunGuard::acquire(&self.in_progress)?;
        let started_at = Utc::now().timestamp_millis();

        self.vault.ensure_folder_exists().await?;

        let state = self.state.load().await?;
        tracing::info!(last_sync_time = state.last_sync_time, "fetching highlights from readeck");

        let fetch = tokio::time::timeout(self.timeout, self.backend.fetch_highlights(state.last_sync_time));
        let articles = tokio::select! {
            result = fetch => result.map_err(|_| SyncError::Timeout(self.timeout.as_secs()))??,
            _ = cancel.cancelled() => {
                tracing::info!("sync cancelled before any note was written");
                return Err(SyncError::Cancelled);
            }
        };

        if articles.is_empty() {
            tracing::info!("no new or updated highlights");
            return Ok(SyncStats::default());
        }

        let mut stats = SyncStats::default();
        for article in &articles {
            self.vault.upsert_article(article).await?.record(&mut stats);
        }

        self.state
            .save(&SyncState {
                last_sync_time: started_at,
            })
            .await?;

        tracing::info!(
            notes_created = stats.notes_created,
            notes_updated = stats.notes_updated,
            highlights = stats.highlights,
            "fetched new highlights"
        );

        Ok(stats)
    }
}
