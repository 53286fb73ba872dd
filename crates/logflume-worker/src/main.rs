//! logflume worker daemon.
//!
//! Connects to Redis and PostgreSQL, then runs the consume/flush loop
//! until SIGINT or SIGTERM asks it to drain.

use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logflume_db::LogStore;
use logflume_queue::{QueueConfig, RedisLogQueue};
use logflume_worker::{config, Error, LogWorker, Result, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "logflume_worker=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "logflume_worker=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("logflume-worker.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let worker_config = WorkerConfig::from_env();
    info!(
        batch_size = worker_config.batch_size,
        flush_interval_secs = worker_config.flush_interval_secs,
        pop_timeout_secs = worker_config.pop_timeout_secs,
        "Worker configuration loaded"
    );

    let database_url = config::database_url()?;

    info!("Connecting to log store...");
    let store = connect_store_with_retries(&database_url, &worker_config).await?;
    logflume_db::log_pool_metrics(&store.pool);
    info!("Log store connected");

    info!("Connecting to envelope queue...");
    let queue = connect_queue_with_retries(&QueueConfig::from_env(), &worker_config).await?;
    info!("Envelope queue connected");

    let worker = LogWorker::new(
        Arc::new(queue),
        Arc::new(store.clone()),
        Arc::new(store.system.clone()),
        Arc::new(store.model_operations.clone()),
        worker_config,
    );
    let mut handle = worker.start();

    tokio::select! {
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, draining worker");
        }
        result = handle.wait() => {
            // Only a fatal bootstrap error ends the worker on its own.
            let stats = result?;
            warn!(batches = stats.batches, "Log worker stopped without a shutdown signal");
            return Ok(());
        }
    }

    let stats = handle.shutdown().await?;
    info!(
        popped = stats.popped,
        batches = stats.batches,
        system_rows = stats.system_rows,
        model_rows = stats.model_rows,
        skipped_malformed = stats.skipped_malformed,
        sink_failures = stats.sink_failures,
        "Drain complete"
    );

    Ok(())
}

/// Connect the sink pool, retrying on the worker's bootstrap schedule.
async fn connect_store_with_retries(
    database_url: &str,
    worker_config: &WorkerConfig,
) -> Result<LogStore> {
    let max_attempts = worker_config.bootstrap_max_retries.saturating_add(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match LogStore::connect(database_url).await {
            Ok(store) => return Ok(store),
            Err(e) if attempt < max_attempts => {
                warn!(
                    subsystem = "worker",
                    attempt,
                    max_attempts,
                    error = %e,
                    "Log store connection failed, retrying"
                );
                tokio::time::sleep(worker_config.bootstrap_retry_delay()).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Connect the queue, retrying on the worker's bootstrap schedule.
async fn connect_queue_with_retries(
    queue_config: &QueueConfig,
    worker_config: &WorkerConfig,
) -> Result<RedisLogQueue> {
    let max_attempts = worker_config.bootstrap_max_retries.saturating_add(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match RedisLogQueue::connect(queue_config).await {
            Ok(queue) => return Ok(queue),
            Err(e) if attempt < max_attempts => {
                warn!(
                    subsystem = "worker",
                    attempt,
                    max_attempts,
                    error = %e,
                    "Queue connection failed, retrying"
                );
                tokio::time::sleep(worker_config.bootstrap_retry_delay()).await;
            }
            Err(e) => {
                return Err(Error::QueueUnavailable(format!(
                    "queue connect failed after {attempt} attempts: {e}"
                )));
            }
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
