//! Worker configuration.

use std::time::Duration;

use logflume_core::defaults::{
    BATCH_SIZE, BOOTSTRAP_MAX_RETRIES, BOOTSTRAP_RETRY_DELAY_SECS, ENV_BATCH_SIZE,
    ENV_BOOTSTRAP_MAX_RETRIES, ENV_BOOTSTRAP_RETRY_DELAY, ENV_DATABASE_URL, ENV_ERROR_BACKOFF,
    ENV_FLUSH_INTERVAL, ENV_POP_TIMEOUT, ERROR_BACKOFF_SECS, FLUSH_INTERVAL_SECS,
    POP_TIMEOUT_SECS,
};
use logflume_core::{Error, Result};

/// Tunables for the flush loop and bootstrap phase.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Flush as soon as this many envelopes are buffered.
    pub batch_size: usize,
    /// Flush a non-empty buffer once this many seconds passed since the
    /// last flush.
    pub flush_interval_secs: f64,
    /// How long a single blocking pop waits before returning empty. Also
    /// bounds how quickly the worker notices a shutdown signal.
    pub pop_timeout_secs: f64,
    /// Pause after a failed pop before trying again.
    pub error_backoff_secs: f64,
    /// Retries after the first failed bootstrap attempt before giving up.
    pub bootstrap_max_retries: u32,
    /// Fixed delay between bootstrap attempts.
    pub bootstrap_retry_delay_secs: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            flush_interval_secs: FLUSH_INTERVAL_SECS,
            pop_timeout_secs: POP_TIMEOUT_SECS,
            error_backoff_secs: ERROR_BACKOFF_SECS,
            bootstrap_max_retries: BOOTSTRAP_MAX_RETRIES,
            bootstrap_retry_delay_secs: BOOTSTRAP_RETRY_DELAY_SECS,
        }
    }
}

impl WorkerConfig {
    /// Create configuration from environment variables.
    ///
    /// | Variable                         | Default | Description                          |
    /// |----------------------------------|---------|--------------------------------------|
    /// | `LOG_BATCH_SIZE`                 | `100`   | Envelopes per flush                  |
    /// | `LOG_FLUSH_INTERVAL_SECS`        | `5.0`   | Max seconds a buffered envelope waits|
    /// | `LOG_POP_TIMEOUT_SECS`           | `1.0`   | Blocking pop timeout                 |
    /// | `LOG_ERROR_BACKOFF_SECS`         | `1.0`   | Pause after a failed pop             |
    /// | `LOG_BOOTSTRAP_MAX_RETRIES`      | `5`     | Bootstrap retries before fatal exit  |
    /// | `LOG_BOOTSTRAP_RETRY_DELAY_SECS` | `2.0`   | Delay between bootstrap attempts     |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_size: std::env::var(ENV_BATCH_SIZE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.batch_size),
            flush_interval_secs: std::env::var(ENV_FLUSH_INTERVAL)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.flush_interval_secs),
            pop_timeout_secs: std::env::var(ENV_POP_TIMEOUT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pop_timeout_secs),
            error_backoff_secs: std::env::var(ENV_ERROR_BACKOFF)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.error_backoff_secs),
            bootstrap_max_retries: std::env::var(ENV_BOOTSTRAP_MAX_RETRIES)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bootstrap_max_retries),
            bootstrap_retry_delay_secs: std::env::var(ENV_BOOTSTRAP_RETRY_DELAY)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bootstrap_retry_delay_secs),
        }
    }

    /// Set the batch size (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the flush interval in seconds.
    pub fn with_flush_interval_secs(mut self, secs: f64) -> Self {
        self.flush_interval_secs = secs;
        self
    }

    /// Set the pop timeout in seconds.
    pub fn with_pop_timeout_secs(mut self, secs: f64) -> Self {
        self.pop_timeout_secs = secs;
        self
    }

    /// Set the error backoff in seconds.
    pub fn with_error_backoff_secs(mut self, secs: f64) -> Self {
        self.error_backoff_secs = secs;
        self
    }

    /// Set the number of bootstrap retries.
    pub fn with_bootstrap_max_retries(mut self, retries: u32) -> Self {
        self.bootstrap_max_retries = retries;
        self
    }

    /// Set the bootstrap retry delay in seconds.
    pub fn with_bootstrap_retry_delay_secs(mut self, secs: f64) -> Self {
        self.bootstrap_retry_delay_secs = secs;
        self
    }

    /// Flush interval as a `Duration`, falling back to the default when the
    /// configured value is not a valid duration.
    pub fn flush_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.flush_interval_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(FLUSH_INTERVAL_SECS))
    }

    /// Error backoff as a `Duration`.
    pub fn error_backoff(&self) -> Duration {
        Duration::try_from_secs_f64(self.error_backoff_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(ERROR_BACKOFF_SECS))
    }

    /// Bootstrap retry delay as a `Duration`.
    pub fn bootstrap_retry_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.bootstrap_retry_delay_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(BOOTSTRAP_RETRY_DELAY_SECS))
    }
}

/// The sink database URL. Required; the worker refuses to start without it
/// rather than silently writing to a default host.
pub fn database_url() -> Result<String> {
    std::env::var(ENV_DATABASE_URL)
        .map_err(|_| Error::Config(format!("{ENV_DATABASE_URL} is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.flush_interval_secs, 5.0);
        assert_eq!(config.pop_timeout_secs, 1.0);
        assert_eq!(config.error_backoff_secs, 1.0);
        assert_eq!(config.bootstrap_max_retries, 5);
        assert_eq!(config.bootstrap_retry_delay_secs, 2.0);
    }

    #[test]
    fn test_with_batch_size() {
        let config = WorkerConfig::default().with_batch_size(250);
        assert_eq!(config.batch_size, 250);
    }

    #[test]
    fn test_with_batch_size_clamps_to_one() {
        let config = WorkerConfig::default().with_batch_size(0);
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn test_with_flush_interval_secs() {
        let config = WorkerConfig::default().with_flush_interval_secs(0.5);
        assert_eq!(config.flush_interval_secs, 0.5);
    }

    #[test]
    fn test_with_pop_timeout_secs() {
        let config = WorkerConfig::default().with_pop_timeout_secs(0.2);
        assert_eq!(config.pop_timeout_secs, 0.2);
    }

    #[test]
    fn test_with_error_backoff_secs() {
        let config = WorkerConfig::default().with_error_backoff_secs(3.0);
        assert_eq!(config.error_backoff_secs, 3.0);
    }

    #[test]
    fn test_with_bootstrap_settings() {
        let config = WorkerConfig::default()
            .with_bootstrap_max_retries(2)
            .with_bootstrap_retry_delay_secs(0.1);
        assert_eq!(config.bootstrap_max_retries, 2);
        assert_eq!(config.bootstrap_retry_delay_secs, 0.1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = WorkerConfig::default()
            .with_batch_size(10)
            .with_flush_interval_secs(1.0)
            .with_pop_timeout_secs(0.1)
            .with_error_backoff_secs(0.1);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.flush_interval_secs, 1.0);
        assert_eq!(config.pop_timeout_secs, 0.1);
        assert_eq!(config.error_backoff_secs, 0.1);
    }

    #[test]
    fn test_duration_accessors() {
        let config = WorkerConfig::default()
            .with_flush_interval_secs(2.5)
            .with_error_backoff_secs(0.25)
            .with_bootstrap_retry_delay_secs(1.5);
        assert_eq!(config.flush_interval(), Duration::from_millis(2500));
        assert_eq!(config.error_backoff(), Duration::from_millis(250));
        assert_eq!(config.bootstrap_retry_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_invalid_duration_falls_back_to_default() {
        let config = WorkerConfig::default().with_flush_interval_secs(-1.0);
        assert_eq!(config.flush_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_is_clone_and_debug() {
        let config = WorkerConfig::default();
        let cloned = config.clone();
        assert_eq!(config.batch_size, cloned.batch_size);
        let debug = format!("{:?}", config);
        assert!(debug.contains("WorkerConfig"));
        assert!(debug.contains("batch_size"));
    }
}
