use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use chrono::{DateTime, Utc};
use readeck_sync::config::{Cli, Command, Config, default_config_dir, default_config_path};
use readeck_sync::state::SyncStateStore;
use readeck_sync::sync::Synchronizer;
use readeck_sync::transport::Transport;
use readeck_sync::unpack_error;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    // Notes and sync state live next to the config file; without --config
    // everything goes under ~/.readeck-sync/
    let (config_path, data_dir) = match args.config_path {
        Some(path) => {
            let path = PathBuf::from(path);
            let dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            (path, dir)
        }
        None => (default_config_path(), default_config_dir()),
    };

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("failed to create data directory {:?}: {}", data_dir, e);
        std::process::exit(1);
    }

    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("readeck-sync starting");

    let cfg = Config::new(&config_path.to_string_lossy()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });

    let command = args.command.unwrap_or(Command::Sync { watch: false });

    // status and reset only touch the state file, so they work without a token
    let store = SyncStateStore::new(cfg.state_file(&data_dir));
    match command {
        Command::Status => std::process::exit(status(&store).await),
        Command::Reset => std::process::exit(reset(&store).await),
        _ => {}
    }

    let synchronizer = Synchronizer::from_config(&cfg, &data_dir).unwrap_or_else(|e| {
        tracing::error!(error = %unpack_error(&e), "failed to set up sync");
        std::process::exit(1);
    });

    let code = match command {
        Command::Check => check(&synchronizer).await,
        Command::Sync { watch: false } => sync_once(&synchronizer, &CancellationToken::new()).await,
        Command::Sync { watch: true } => {
            watch(&synchronizer, Duration::from_secs(cfg.sync.interval_seconds.max(1))).await
        }
        Command::Status | Command::Reset => 0,
    };

    tracing::info!("readeck-sync done");
    std::process::exit(code);
}

async fn check<T: Transport>(synchronizer: &Synchronizer<T>) -> i32 {
    match synchronizer.check_connection().await {
        Ok(()) => {
            tracing::info!("readeck is reachable and the token is accepted");
            0
        }
        Err(e) => {
            tracing::error!(error = %unpack_error(&e), "connection check failed");
            1
        }
    }
}

async fn status(store: &SyncStateStore) -> i32 {
    match store.load().await {
        Ok(state) if state.last_sync_time == 0 => {
            tracing::info!(last_sync_time = 0, "never synced");
            0
        }
        Ok(state) => {
            let at = DateTime::<Utc>::from_timestamp_millis(state.last_sync_time)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "out of range".to_string());
            tracing::info!(last_sync_time = state.last_sync_time, at = %at, "last successful sync");
            0
        }
        Err(e) => {
            tracing::error!(error = ?e, "failed to read sync state");
            1
        }
    }
}

async fn reset(store: &SyncStateStore) -> i32 {
    match store.reset().await {
        Ok(()) => {
            tracing::info!("sync state reset, next sync fetches every highlight");
            0
        }
        Err(e) => {
            tracing::error!(error = ?e, "failed to reset sync state");
            1
        }
    }
}

async fn sync_once<T: Transport>(synchronizer: &Synchronizer<T>, cancel: &CancellationToken) -> i32 {
    match synchronizer.run_until_cancelled(cancel).await {
        Ok(stats) => {
            tracing::info!(
                notes_created = stats.notes_created,
                notes_updated = stats.notes_updated,
                "fetched {} new highlights",
                stats.highlights
            );
            0
        }
        Err(e) => {
            tracing::error!(error = %unpack_error(&e), "sync failed");
            1
        }
    }
}

async fn watch<T: Transport>(synchronizer: &Synchronizer<T>, every: Duration) -> i32 {
    let cancellation_token = CancellationToken::new();

    let ctrl_c_token = cancellation_token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl+c signal received, preparing to shutdown");
        }
        ctrl_c_token.cancel();
    });

    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                // a failed run is retried on the next tick from the same timestamp
                sync_once(synchronizer, &cancellation_token).await;
                if cancellation_token.is_cancelled() {
                    tracing::info!("watch loop shutting down");
                    break;
                }
            }
            _ = cancellation_token.cancelled() => {
                tracing::info!("watch loop shutting down");
                break;
            }
        }
    }

    0
}
