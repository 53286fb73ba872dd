//! Queue consumer with batch flushing and graceful drain.
//!
//! Lifecycle: init -> bootstrapping -> running -> draining -> stopped.
//! Bootstrap pings the queue and creates the sink schema, retrying with a
//! fixed delay; exhausting the retries is fatal. The running loop pops
//! with a timeout, buffers payloads, and flushes when the buffer reaches
//! the batch size or the flush interval has passed. A shutdown signal
//! stops popping, flushes what is buffered, and leaves the rest of the
//! queue for the next start.
//!
//! The loop checks for shutdown between pops instead of racing the pop
//! against the signal: a payload already popped must reach the flush
//! buffer, not die inside a cancelled future. Worst case this delays
//! shutdown by one pop timeout.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use logflume_core::{
    Error, LogQueue, ModelOperationLogSink, Result, SchemaBootstrap, SystemLogSink,
};

use crate::config::WorkerConfig;
use crate::flush::flush_batch;

/// Lifecycle states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Init,
    Bootstrapping,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Init => "init",
            WorkerState::Bootstrapping => "bootstrapping",
            WorkerState::Running => "running",
            WorkerState::Draining => "draining",
            WorkerState::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

/// Counters accumulated over one worker run, reported at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Payloads popped from the queue.
    pub popped: u64,
    /// Flushes performed.
    pub batches: u64,
    /// Rows committed to `system_logs`.
    pub system_rows: u64,
    /// Rows committed to `model_operation_logs`.
    pub model_rows: u64,
    /// Payloads skipped as malformed.
    pub skipped_malformed: u64,
    /// Sink transactions that failed (their rows are lost).
    pub sink_failures: u64,
    /// Failed pops (each followed by an error backoff).
    pub pop_errors: u64,
}

/// Handle to a started worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<Result<WorkerStats>>,
}

impl WorkerHandle {
    /// Ask the worker to drain and wait for it to stop.
    pub async fn shutdown(mut self) -> Result<WorkerStats> {
        if self.shutdown_tx.send(()).await.is_err() {
            debug!(
                subsystem = "worker",
                "Worker already stopped when shutdown was requested"
            );
        }
        self.wait().await
    }

    /// Wait for the worker to stop on its own, which before a shutdown
    /// request only happens on a fatal bootstrap error.
    pub async fn wait(&mut self) -> Result<WorkerStats> {
        match (&mut self.join).await {
            Ok(result) => result,
            Err(e) => Err(Error::Internal(format!("worker task failed: {e}"))),
        }
    }
}

enum BootstrapOutcome {
    Ready,
    Interrupted,
}

/// The consuming end of the pipeline: one queue, two sinks.
pub struct LogWorker {
    queue: Arc<dyn LogQueue>,
    schema: Arc<dyn SchemaBootstrap>,
    system_sink: Arc<dyn SystemLogSink>,
    model_sink: Arc<dyn ModelOperationLogSink>,
    config: WorkerConfig,
    state: WorkerState,
    stats: WorkerStats,
}

impl LogWorker {
    pub fn new(
        queue: Arc<dyn LogQueue>,
        schema: Arc<dyn SchemaBootstrap>,
        system_sink: Arc<dyn SystemLogSink>,
        model_sink: Arc<dyn ModelOperationLogSink>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            schema,
            system_sink,
            model_sink,
            config,
            state: WorkerState::Init,
            stats: WorkerStats::default(),
        }
    }

    /// Spawn the worker task and return its handle.
    pub fn start(mut self) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let join = tokio::spawn(async move { self.run(shutdown_rx).await });
        WorkerHandle { shutdown_tx, join }
    }

    async fn run(&mut self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<WorkerStats> {
        self.transition(WorkerState::Bootstrapping);
        match self.bootstrap(&mut shutdown_rx).await {
            Ok(BootstrapOutcome::Ready) => {}
            Ok(BootstrapOutcome::Interrupted) => {
                info!(subsystem = "worker", "Shutdown signal received during bootstrap");
                self.transition(WorkerState::Stopped);
                return Ok(self.stats);
            }
            Err(e) => {
                error!(subsystem = "worker", error = %e, "Bootstrap failed, worker will not run");
                self.transition(WorkerState::Stopped);
                return Err(e);
            }
        }

        self.transition(WorkerState::Running);
        match self.queue.depth().await {
            Ok(depth) => info!(subsystem = "worker", queue_depth = depth, "Log worker running"),
            Err(e) => warn!(subsystem = "worker", error = %e, "Could not read queue depth"),
        }

        let mut buffer: Vec<String> = Vec::with_capacity(self.config.batch_size);
        let mut last_flush = Instant::now();

        loop {
            // Signal checks happen between iterations, so signal-to-drain
            // latency is bounded by one pop timeout.
            if shutdown_rx.try_recv().is_ok() {
                info!(subsystem = "worker", "Shutdown signal received");
                break;
            }

            match self.queue.pop(self.config.pop_timeout_secs).await {
                Ok(Some(payload)) => {
                    self.stats.popped += 1;
                    buffer.push(payload);
                }
                Ok(None) => {
                    // Pop timed out with nothing queued.
                }
                Err(e) => {
                    self.stats.pop_errors += 1;
                    error!(subsystem = "worker", error = %e, "Queue pop failed");
                    if !backoff_or_shutdown(self.config.error_backoff(), &mut shutdown_rx).await {
                        info!(
                            subsystem = "worker",
                            "Shutdown signal received during backoff"
                        );
                        break;
                    }
                    continue;
                }
            }

            let batch_full = buffer.len() >= self.config.batch_size;
            let interval_elapsed =
                !buffer.is_empty() && last_flush.elapsed() >= self.config.flush_interval();
            if batch_full || interval_elapsed {
                self.flush_buffer(&mut buffer).await;
                last_flush = Instant::now();
            }
        }

        self.transition(WorkerState::Draining);
        if !buffer.is_empty() {
            self.flush_buffer(&mut buffer).await;
        }
        if let Ok(depth) = self.queue.depth().await {
            if depth > 0 {
                info!(
                    subsystem = "worker",
                    queue_depth = depth,
                    "Entries left queued for the next start"
                );
            }
        }

        self.transition(WorkerState::Stopped);
        info!(
            subsystem = "worker",
            popped = self.stats.popped,
            batches = self.stats.batches,
            system_rows = self.stats.system_rows,
            model_rows = self.stats.model_rows,
            skipped_malformed = self.stats.skipped_malformed,
            sink_failures = self.stats.sink_failures,
            pop_errors = self.stats.pop_errors,
            "Log worker stopped"
        );
        Ok(self.stats)
    }

    /// Verify the queue is reachable and the sink schema exists.
    ///
    /// Each phase gets `bootstrap_max_retries` retries after its first
    /// failed attempt, with a fixed delay in between. Exhaustion is fatal.
    async fn bootstrap(
        &self,
        shutdown_rx: &mut mpsc::Receiver<()>,
    ) -> Result<BootstrapOutcome> {
        let max_attempts = self.config.bootstrap_max_retries.saturating_add(1);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.queue.ping().await {
                Ok(()) => break,
                Err(e) if attempt < max_attempts => {
                    warn!(
                        subsystem = "worker",
                        attempt,
                        max_attempts,
                        error = %e,
                        "Queue ping failed, retrying"
                    );
                    if !backoff_or_shutdown(self.config.bootstrap_retry_delay(), shutdown_rx)
                        .await
                    {
                        return Ok(BootstrapOutcome::Interrupted);
                    }
                }
                Err(e) => {
                    return Err(Error::QueueUnavailable(format!(
                        "queue unreachable after {attempt} attempts: {e}"
                    )));
                }
            }
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.schema.ensure_schema().await {
                Ok(()) => break,
                Err(e) if attempt < max_attempts => {
                    warn!(
                        subsystem = "worker",
                        attempt,
                        max_attempts,
                        error = %e,
                        "Schema bootstrap failed, retrying"
                    );
                    if !backoff_or_shutdown(self.config.bootstrap_retry_delay(), shutdown_rx)
                        .await
                    {
                        return Ok(BootstrapOutcome::Interrupted);
                    }
                }
                Err(e) => {
                    return Err(Error::SchemaBootstrap(format!(
                        "schema not ready after {attempt} attempts: {e}"
                    )));
                }
            }
        }

        Ok(BootstrapOutcome::Ready)
    }

    async fn flush_buffer(&mut self, buffer: &mut Vec<String>) {
        let payloads = std::mem::take(buffer);
        let outcome = flush_batch(&self.system_sink, &self.model_sink, payloads).await;
        self.stats.batches += 1;
        self.stats.system_rows += outcome.system_rows;
        self.stats.model_rows += outcome.model_rows;
        self.stats.skipped_malformed += outcome.skipped;
        self.stats.sink_failures += outcome.sink_failures;
    }

    fn transition(&mut self, next: WorkerState) {
        info!(
            subsystem = "worker",
            from = %self.state,
            state = %next,
            "Worker state changed"
        );
        self.state = next;
    }
}

/// Sleep out the delay unless shutdown arrives first.
///
/// Returns false when shutdown was requested.
async fn backoff_or_shutdown(delay: Duration, shutdown_rx: &mut mpsc::Receiver<()>) -> bool {
    tokio::select! {
        _ = shutdown_rx.recv() => false,
        _ = sleep(delay) => true,
    }
}
