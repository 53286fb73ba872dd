//! Fire-and-forget log producer.
//!
//! [`LogProducer::record`] hands an envelope to a small pool of sender
//! tasks over a bounded channel and returns immediately. The sender tasks
//! redact credentials, serialize, and push onto the queue. Every failure
//! mode (full channel, serialization error, queue unreachable) drops the
//! envelope with a warning; recording a log must never take down or slow
//! the request that produced it, and envelopes are never written to the
//! primary database as a fallback.

use std::sync::Arc;

use logflume_core::defaults::{
    DEFAULT_DEPLOYMENT_ENVIRONMENT, ENV_DEPLOYMENT_ENVIRONMENT, ENV_DEPLOYMENT_VERSION,
    ENV_PRODUCER_CAPACITY, ENV_PRODUCER_ENABLED, ENV_PRODUCER_WORKERS, PRODUCER_CAPACITY,
    PRODUCER_WORKERS,
};
use logflume_core::redact::redact_envelope;
use logflume_core::{LogEnvelope, LogQueue};
use logflume_queue::{QueueConfig, RedisLogQueue};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Configuration for the producer's channel and sender pool.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Whether the producer is enabled. When disabled, `record` is a no-op.
    pub enabled: bool,
    /// Bounded channel capacity between `record` and the sender pool.
    pub capacity: usize,
    /// Number of sender tasks draining the channel.
    pub workers: usize,
    /// Deployment version stamped onto envelopes that lack one.
    pub deployment_version: String,
    /// Deployment environment stamped onto envelopes that lack one.
    pub deployment_environment: String,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: PRODUCER_CAPACITY,
            workers: PRODUCER_WORKERS,
            deployment_version: env!("CARGO_PKG_VERSION").to_string(),
            deployment_environment: DEFAULT_DEPLOYMENT_ENVIRONMENT.to_string(),
        }
    }
}

impl ProducerConfig {
    /// Create configuration from environment variables.
    ///
    /// | Variable                 | Default       | Description                          |
    /// |--------------------------|---------------|--------------------------------------|
    /// | `LOG_PRODUCER_ENABLED`   | `true`        | Disable to make `record` a no-op     |
    /// | `LOG_PRODUCER_CAPACITY`  | `1024`        | Bounded channel capacity             |
    /// | `LOG_PRODUCER_WORKERS`   | `2`           | Sender tasks draining the channel    |
    /// | `DEPLOYMENT_VERSION`     | crate version | Stamped onto outgoing envelopes      |
    /// | `DEPLOYMENT_ENVIRONMENT` | `development` | Stamped onto outgoing envelopes      |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var(ENV_PRODUCER_ENABLED)
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.enabled),
            capacity: std::env::var(ENV_PRODUCER_CAPACITY)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.capacity),
            workers: std::env::var(ENV_PRODUCER_WORKERS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.workers),
            deployment_version: std::env::var(ENV_DEPLOYMENT_VERSION)
                .unwrap_or(defaults.deployment_version),
            deployment_environment: std::env::var(ENV_DEPLOYMENT_ENVIRONMENT)
                .unwrap_or(defaults.deployment_environment),
        }
    }

    /// Set whether the producer is enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the bounded channel capacity (minimum 1).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Set the number of sender tasks (minimum 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the deployment version tag.
    pub fn with_deployment_version(mut self, version: impl Into<String>) -> Self {
        self.deployment_version = version.into();
        self
    }

    /// Set the deployment environment tag.
    pub fn with_deployment_environment(mut self, environment: impl Into<String>) -> Self {
        self.deployment_environment = environment.into();
        self
    }
}

/// Handle for recording log envelopes. Cheap to clone; all clones feed the
/// same sender pool.
#[derive(Clone)]
pub struct LogProducer {
    tx: Option<mpsc::Sender<LogEnvelope>>,
    deployment_version: String,
    deployment_environment: String,
}

impl LogProducer {
    /// Start the sender pool against the given queue.
    pub fn start(queue: Arc<dyn LogQueue>, config: ProducerConfig) -> Self {
        if !config.enabled {
            info!(subsystem = "producer", "Log producer is disabled, events will be discarded");
            return Self::disabled();
        }

        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let workers = config.workers.max(1);
        for sender_id in 0..workers {
            tokio::spawn(sender_loop(sender_id, Arc::clone(&queue), Arc::clone(&rx)));
        }
        info!(
            subsystem = "producer",
            workers,
            capacity = config.capacity,
            "Log producer started"
        );

        Self {
            tx: Some(tx),
            deployment_version: config.deployment_version,
            deployment_environment: config.deployment_environment,
        }
    }

    /// Connect to Redis using environment configuration and start the pool.
    ///
    /// An unreachable queue degrades to a disabled producer with a warning
    /// instead of failing application startup.
    pub async fn from_env() -> Self {
        let config = ProducerConfig::from_env();
        if !config.enabled {
            info!(subsystem = "producer", "Log producer is disabled, events will be discarded");
            return Self::disabled();
        }
        match RedisLogQueue::connect(&QueueConfig::from_env()).await {
            Ok(queue) => Self::start(Arc::new(queue), config),
            Err(e) => {
                warn!(
                    subsystem = "producer",
                    error = %e,
                    "Log queue unavailable, producer disabled for this process"
                );
                Self::disabled()
            }
        }
    }

    /// A producer that silently discards every envelope.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            deployment_version: String::new(),
            deployment_environment: String::new(),
        }
    }

    /// Whether this producer forwards envelopes to a queue.
    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue an envelope for delivery. Returns immediately and never fails.
    ///
    /// Deployment tags are stamped onto envelopes that do not already carry
    /// them. A full channel drops the envelope with a warning.
    pub fn record(&self, mut envelope: LogEnvelope) {
        let Some(tx) = &self.tx else {
            return;
        };

        if envelope.deployment_version.is_none() {
            envelope.deployment_version = Some(self.deployment_version.clone());
        }
        if envelope.deployment_environment.is_none() {
            envelope.deployment_environment = Some(self.deployment_environment.clone());
        }

        match tx.try_send(envelope) {
            Ok(()) => {}
            Err(TrySendError::Full(envelope)) => {
                warn!(
                    subsystem = "producer",
                    channel = %envelope.channel,
                    level = %envelope.level,
                    "Log channel full, dropping event"
                );
            }
            Err(TrySendError::Closed(_)) => {
                warn!(subsystem = "producer", "Log channel closed, dropping event");
            }
        }
    }
}

/// Drains the shared channel, redacts, serializes, and pushes.
///
/// The receiver sits behind a mutex so several sender tasks can share it;
/// whichever task is idle takes the next envelope. The lock is released
/// before the queue push so a slow push never blocks the other senders.
async fn sender_loop(
    sender_id: usize,
    queue: Arc<dyn LogQueue>,
    rx: Arc<Mutex<mpsc::Receiver<LogEnvelope>>>,
) {
    loop {
        let envelope = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        // None means every producer handle has been dropped.
        let Some(mut envelope) = envelope else {
            break;
        };

        redact_envelope(&mut envelope);
        let payload = match serde_json::to_string(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    subsystem = "producer",
                    sender_id,
                    error = %e,
                    "Failed to serialize envelope, dropping event"
                );
                continue;
            }
        };
        if let Err(e) = queue.push(payload).await {
            warn!(
                subsystem = "producer",
                sender_id,
                error = %e,
                "Queue push failed, dropping event"
            );
        }
    }
    debug!(subsystem = "producer", sender_id, "Sender task exited");
}


#[cfg(test)]
mod tests {
    use super::test_support::CapturingQueue;
    use super::*;
    use logflume_core::defaults::REDACTION_MARKER;
    use logflume_core::LogLevel;
    use std::time::Duration;

    #[test]
    fn test_config_defaults() {
        let config = ProducerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.capacity, PRODUCER_CAPACITY);
        assert_eq!(config.workers, PRODUCER_WORKERS);
        assert_eq!(config.deployment_environment, "development");
        assert!(!config.deployment_version.is_empty());
    }

    #[test]
    fn test_config_builders() {
        let config = ProducerConfig::default()
            .with_enabled(false)
            .with_capacity(64)
            .with_workers(4)
            .with_deployment_version("2026.8.1")
            .with_deployment_environment("staging");
        assert!(!config.enabled);
        assert_eq!(config.capacity, 64);
        assert_eq!(config.workers, 4);
        assert_eq!(config.deployment_version, "2026.8.1");
        assert_eq!(config.deployment_environment, "staging");
    }

    #[test]
    fn test_config_builders_clamp_to_one() {
        let config = ProducerConfig::default().with_capacity(0).with_workers(0);
        assert_eq!(config.capacity, 1);
        assert_eq!(config.workers, 1);
    }

    #[tokio::test]
    async fn test_disabled_producer_discards_without_panic() {
        let producer = LogProducer::disabled();
        assert!(!producer.is_enabled());
        producer.record(LogEnvelope::system(LogLevel::Info, "ignored"));
    }

    #[tokio::test]
    async fn test_disabled_config_yields_disabled_producer() {
        let queue = CapturingQueue::new();
        let producer = LogProducer::start(
            Arc::clone(&queue) as Arc<dyn LogQueue>,
            ProducerConfig::default().with_enabled(false),
        );
        assert!(!producer.is_enabled());
        producer.record(LogEnvelope::system(LogLevel::Info, "ignored"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(queue.pushes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_record_delivers_serialized_envelope() {
        let queue = CapturingQueue::new();
        let producer = LogProducer::start(
            Arc::clone(&queue) as Arc<dyn LogQueue>,
            ProducerConfig::default().with_workers(1),
        );

        producer.record(
            LogEnvelope::system(LogLevel::Info, "user signed in").with_component("auth"),
        );

        let pushes = queue.wait_for(1).await;
        assert_eq!(pushes.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&pushes[0]).unwrap();
        assert_eq!(value["channel"], "system");
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["message"], "user signed in");
        assert_eq!(value["component"], "auth");
    }

    #[tokio::test]
    async fn test_record_redacts_credentials_before_push() {
        let queue = CapturingQueue::new();
        let producer = LogProducer::start(
            Arc::clone(&queue) as Arc<dyn LogQueue>,
            ProducerConfig::default(),
        );

        producer.record(
            LogEnvelope::system(LogLevel::Warning, "upstream call failed").with_metadata(
                serde_json::json!({
                    "authorization": "Bearer sk-live-123456",
                    "attempt": 2,
                }),
            ),
        );

        let pushes = queue.wait_for(1).await;
        assert!(!pushes[0].contains("sk-live-123456"));
        assert!(pushes[0].contains(REDACTION_MARKER));
        let value: serde_json::Value = serde_json::from_str(&pushes[0]).unwrap();
        assert_eq!(value["metadata"]["attempt"], 2);
    }

    #[tokio::test]
    async fn test_record_stamps_deployment_tags() {
        let queue = CapturingQueue::new();
        let producer = LogProducer::start(
            Arc::clone(&queue) as Arc<dyn LogQueue>,
            ProducerConfig::default()
                .with_deployment_version("2026.8.22")
                .with_deployment_environment("production"),
        );

        producer.record(LogEnvelope::system(LogLevel::Info, "tagged"));

        let pushes = queue.wait_for(1).await;
        let value: serde_json::Value = serde_json::from_str(&pushes[0]).unwrap();
        assert_eq!(value["deployment_version"], "2026.8.22");
        assert_eq!(value["deployment_environment"], "production");
    }

    #[tokio::test]
    async fn test_record_keeps_explicit_deployment_tags() {
        let queue = CapturingQueue::new();
        let producer = LogProducer::start(
            Arc::clone(&queue) as Arc<dyn LogQueue>,
            ProducerConfig::default().with_deployment_environment("production"),
        );

        producer.record(
            LogEnvelope::system(LogLevel::Info, "tagged")
                .with_deployment("2025.1.0", "canary"),
        );

        let pushes = queue.wait_for(1).await;
        let value: serde_json::Value = serde_json::from_str(&pushes[0]).unwrap();
        assert_eq!(value["deployment_version"], "2025.1.0");
        assert_eq!(value["deployment_environment"], "canary");
    }

    #[tokio::test]
    async fn test_full_channel_drops_instead_of_blocking() {
        // A queue that never completes a push keeps the single sender busy,
        // so the channel fills and record keeps returning immediately.
        struct StuckQueue;

        #[async_trait::async_trait]
        impl LogQueue for StuckQueue {
            async fn push(&self, _payload: String) -> logflume_core::Result<()> {
                std::future::pending::<()>().await;
                Ok(())
            }

            async fn pop(&self, _timeout_secs: f64) -> logflume_core::Result<Option<String>> {
                Ok(None)
            }

            async fn ping(&self) -> logflume_core::Result<()> {
                Ok(())
            }

            async fn depth(&self) -> logflume_core::Result<i64> {
                Ok(0)
            }
        }

        let producer = LogProducer::start(
            Arc::new(StuckQueue),
            ProducerConfig::default().with_capacity(2).with_workers(1),
        );

        for i in 0..20 {
            producer.record(LogEnvelope::system(LogLevel::Info, format!("event {i}")));
        }
        // Reaching this point is the assertion: record never blocked.
        assert!(producer.is_enabled());
    }
}
