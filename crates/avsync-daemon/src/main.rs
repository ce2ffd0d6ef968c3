//! avsync daemon - background crawl service
//!
//! This binary runs as a systemd user service and handles:
//! - Periodic crawl passes against av.by
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon loads its configuration, refuses to start when it is
//! invalid, and then enters a main loop that periodically runs the
//! crawl engine. The loop is controlled by a `CancellationToken` that
//! is triggered on receipt of SIGTERM or SIGINT; a pass that is already
//! running finishes before the daemon exits.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use avsync_avby::{AvbyClient, AvbyMarketplaceProvider};
use avsync_core::{config::Config, ports::IRecordStore};
use avsync_engine::SyncEngine;
use avsync_photos::FilePhotoImporter;
use avsync_store::{DatabasePool, SqliteRecordStore};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// DaemonService struct
// ============================================================================

/// Main daemon service that schedules crawl passes
///
/// Holds the configuration, the record store shared with the engine,
/// and a cancellation token for graceful shutdown.
struct DaemonService {
    /// Application configuration loaded from YAML
    config: Config,
    /// SQLite record store backing catalog reads and record writes
    store: Arc<SqliteRecordStore>,
    /// Token for signalling graceful shutdown to all async tasks
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Creates a new DaemonService
    ///
    /// Validates the configuration and opens the record store. A
    /// configuration with validation problems aborts startup; a daemon
    /// quietly crawling with a broken setup helps nobody.
    async fn new(config: Config, shutdown: CancellationToken) -> Result<Self> {
        let problems = config.validate();
        if !problems.is_empty() {
            for problem in &problems {
                error!(field = %problem.field, message = %problem.message, "Invalid configuration");
            }
            anyhow::bail!(
                "configuration has {} problem(s); fix {} and restart",
                problems.len(),
                Config::default_path().display()
            );
        }

        let pool = DatabasePool::new(&config.store.database_path)
            .await
            .context("Failed to open record store")?;
        let store = Arc::new(SqliteRecordStore::new(pool.pool().clone()));

        Ok(Self {
            config,
            store,
            shutdown,
        })
    }

    // ========================================================================
    // DaemonService::run() - adapter wiring
    // ========================================================================

    /// Builds the crawl engine and enters the polling loop
    async fn run(&self) -> Result<()> {
        let timeout = Duration::from_secs(self.config.api.timeout_secs);

        let client = AvbyClient::with_base_url(timeout, self.config.api.base_url.as_str())
            .context("Failed to build av.by client")?;
        let marketplace = Arc::new(AvbyMarketplaceProvider::new(client));
        let photos = Arc::new(
            FilePhotoImporter::new(timeout, self.config.photos.storage_dir.clone())
                .context("Failed to build photo importer")?,
        );

        let engine = SyncEngine::new(
            marketplace,
            Arc::clone(&self.store) as Arc<dyn IRecordStore>,
            photos,
        );

        self.sync_loop(&engine).await
    }

    // ========================================================================
    // Periodic crawl loop
    // ========================================================================

    /// Main crawl loop with periodic polling
    ///
    /// Uses `tokio::time::interval` based on `config.sync.poll_interval`
    /// (defaults to one day). Each tick runs one engine pass; shutdown is
    /// only observed between passes, never in the middle of one.
    async fn sync_loop(&self, engine: &SyncEngine) -> Result<()> {
        let poll_secs = self.config.sync.poll_interval;
        let with_photos = self.config.sync.with_photos;

        info!(poll_interval_secs = poll_secs, with_photos, "Starting crawl loop");

        let mut interval = tokio::time::interval(Duration::from_secs(poll_secs));
        // The first tick fires immediately; we want to crawl right away
        interval.tick().await;

        loop {
            info!("Starting crawl cycle");

            let report = engine.run(with_photos).await;

            info!(
                entries = report.entries_processed,
                listings = report.listings_seen,
                created = report.records_created,
                duplicates = report.duplicates_skipped,
                photos = report.photos_imported,
                issues = report.issues.len(),
                duration_ms = report.duration_ms,
                "Crawl cycle completed"
            );
            if !report.is_clean() {
                warn!(
                    issues = report.issues.len(),
                    "Cycle finished with isolated failures"
                );
            }

            tokio::select! {
                _ = interval.tick() => {}
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!("Crawl loop terminated");
        Ok(())
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration comes first so logging.level can seed the default
    // filter; RUST_LOG still wins when set.
    let config_path = Config::default_path();
    let config = Config::load_or_default(&config_path);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    info!(config_path = %config_path.display(), "avsync daemon starting (avsyncd)");

    let shutdown_token = CancellationToken::new();

    // Spawn signal handler task
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(config, shutdown_token.clone()).await?;

    let result = service.run().await;

    match &result {
        Ok(()) => info!("avsync daemon shut down gracefully"),
        Err(e) => error!(error = %e, "avsync daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
