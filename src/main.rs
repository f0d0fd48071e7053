//! Audit worker binary.
//!
//! Connects the store and queue, wires the two engines into a
//! processor, and runs the polling worker until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sitepulse::{
    AuditProcessor, AuditWorker, PageAuditEngine, ScraperConfig, SqliteAuditStore, SqliteJobQueue,
    WebsiteScraper, WorkerConfig, WorkerOptions,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = WorkerConfig::from_env().context("invalid worker configuration")?;

    let store = Arc::new(
        SqliteAuditStore::connect(&config.database_url)
            .await
            .context("failed to open audit database")?,
    );
    let queue = Arc::new(
        SqliteJobQueue::connect(&config.queue_url)
            .await
            .context("failed to open job queue")?,
    );

    let scraper = Arc::new(WebsiteScraper::new(ScraperConfig {
        screenshots_dir: config.screenshots_dir.clone(),
        ..ScraperConfig::default()
    }));
    let auditor = Arc::new(PageAuditEngine::default());
    let processor = Arc::new(AuditProcessor::new(store, scraper, auditor));

    let worker = AuditWorker::new(
        queue,
        processor,
        WorkerOptions {
            concurrency: config.concurrency,
            ..WorkerOptions::default()
        },
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown_signal(shutdown.clone()));

    worker.run(shutdown).await;
    Ok(())
}

async fn wait_for_shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
                shutdown.cancel();
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("received SIGINT, shutting down"),
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("received interrupt, shutting down");
    }
    shutdown.cancel();
}
