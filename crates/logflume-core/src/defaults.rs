//! Centralized default constants for the logflume pipeline.
//!
//! **This module is the single source of truth** for shared default values
//! and environment variable names. Producer, queue, and worker crates
//! reference these constants instead of defining their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// QUEUE
// =============================================================================

/// Name of the Redis list carrying both envelope kinds.
pub const QUEUE_KEY: &str = "logs_queue";

/// Environment variable overriding the queue key.
pub const ENV_QUEUE_KEY: &str = "LOG_QUEUE_KEY";

/// Environment variable for the Redis connection URL.
pub const ENV_REDIS_URL: &str = "REDIS_URL";

/// Default Redis connection URL.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Blocking pop timeout in seconds. Bounds how long the worker loop waits
/// on an empty queue before re-evaluating flush conditions and shutdown;
/// also the worst-case added latency between a termination signal and the
/// start of the drain.
pub const POP_TIMEOUT_SECS: f64 = 1.0;

/// Environment variable overriding the pop timeout.
pub const ENV_POP_TIMEOUT: &str = "LOG_POP_TIMEOUT_SECS";

// =============================================================================
// BATCHING
// =============================================================================

/// Flush when the buffer reaches this many envelopes.
pub const BATCH_SIZE: usize = 100;

/// Environment variable overriding the batch size.
pub const ENV_BATCH_SIZE: &str = "LOG_BATCH_SIZE";

/// Flush a non-empty buffer after this many seconds without a size trigger.
pub const FLUSH_INTERVAL_SECS: f64 = 5.0;

/// Environment variable overriding the flush interval.
pub const ENV_FLUSH_INTERVAL: &str = "LOG_FLUSH_INTERVAL_SECS";

/// Sleep after a loop-level queue error before the next pop, so a dead
/// Redis does not turn the worker into a busy spin.
pub const ERROR_BACKOFF_SECS: f64 = 1.0;

/// Environment variable overriding the error backoff.
pub const ENV_ERROR_BACKOFF: &str = "LOG_ERROR_BACKOFF_SECS";

// =============================================================================
// SCHEMA BOOTSTRAP
// =============================================================================

/// Attempts to reach the queue and create the sink schema before the worker
/// gives up and exits.
pub const BOOTSTRAP_MAX_RETRIES: u32 = 5;

/// Environment variable overriding the bootstrap attempt count.
pub const ENV_BOOTSTRAP_MAX_RETRIES: &str = "LOG_BOOTSTRAP_MAX_RETRIES";

/// Fixed delay between bootstrap attempts in seconds.
pub const BOOTSTRAP_RETRY_DELAY_SECS: f64 = 2.0;

/// Environment variable overriding the bootstrap retry delay.
pub const ENV_BOOTSTRAP_RETRY_DELAY: &str = "LOG_BOOTSTRAP_RETRY_DELAY_SECS";

/// Environment variable for the Postgres connection URL of the log store.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

// =============================================================================
// PRODUCER
// =============================================================================

/// Capacity of the bounded channel between `record()` callers and the
/// sender pool. A full channel drops the event rather than blocking the
/// request path.
pub const PRODUCER_CAPACITY: usize = 1024;

/// Environment variable overriding the producer channel capacity.
pub const ENV_PRODUCER_CAPACITY: &str = "LOG_PRODUCER_CAPACITY";

/// Number of background sender tasks serializing and pushing envelopes.
pub const PRODUCER_WORKERS: usize = 2;

/// Environment variable overriding the sender task count.
pub const ENV_PRODUCER_WORKERS: &str = "LOG_PRODUCER_WORKERS";

/// Environment variable disabling the producer entirely ("false"/"0").
/// Useful for test environments without a reachable queue.
pub const ENV_PRODUCER_ENABLED: &str = "LOG_PRODUCER_ENABLED";

// =============================================================================
// REDACTION
// =============================================================================

/// Replacement value for credential-bearing metadata fields.
pub const REDACTION_MARKER: &str = "[REDACTED]";

// =============================================================================
// DEPLOYMENT TAGS
// =============================================================================

/// Environment variable for the deployment version tag.
pub const ENV_DEPLOYMENT_VERSION: &str = "DEPLOYMENT_VERSION";

/// Environment variable for the deployment environment tag.
pub const ENV_DEPLOYMENT_ENVIRONMENT: &str = "DEPLOYMENT_ENVIRONMENT";

/// Deployment environment assumed when the tag variable is unset.
pub const DEFAULT_DEPLOYMENT_ENVIRONMENT: &str = "development";
