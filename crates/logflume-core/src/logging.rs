//! Structured logging schema and field name constants for logflume.
//!
//! All crates use these constants for consistent structured logging fields
//! in the pipeline's own operational log stream (the envelopes it transports
//! are data, not tracing output). This ensures log aggregation tools can
//! query by standardized field names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Dropped batch, fatal bootstrap failure, requires operator attention |
//! | WARN  | Dropped single event, queue hiccup with automatic fallback |
//! | INFO  | Lifecycle events (state transitions, startup, shutdown summary) |
//! | DEBUG | Flush decisions, config choices, per-batch row counts |
//! | TRACE | Per-envelope handling |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "producer", "queue", "db", "worker"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "sender", "pool", "bootstrap", "flush"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "push", "pop", "flush", "ensure_schema"
pub const OPERATION: &str = "op";

/// Worker state machine position ("init", "bootstrapping", "running",
/// "draining", "stopped").
pub const STATE: &str = "state";

// ─── Queue fields ──────────────────────────────────────────────────────────

/// Name of the Redis list being pushed to or popped from.
pub const QUEUE_KEY: &str = "queue_key";

/// Number of envelopes waiting in the queue.
pub const QUEUE_DEPTH: &str = "queue_depth";

/// Envelope routing channel ("system", "model_operation").
pub const CHANNEL: &str = "channel";

// ─── Batch fields ──────────────────────────────────────────────────────────

/// Number of buffered payloads entering a flush.
pub const BATCH_LEN: &str = "batch_len";

/// Rows written to one sink in one transaction.
pub const ROW_COUNT: &str = "row_count";

/// Destination sink table name.
pub const SINK: &str = "sink";

/// Malformed payloads skipped during a flush.
pub const SKIPPED: &str = "skipped";

/// Envelopes dropped without persistence (producer overflow, failed batch).
pub const DROPPED: &str = "dropped";

// ─── Retry fields ──────────────────────────────────────────────────────────

/// Current attempt number (1-based).
pub const ATTEMPT: &str = "attempt";

/// Attempt ceiling for the operation.
pub const MAX_ATTEMPTS: &str = "max_attempts";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Run summary fields (worker shutdown line) ─────────────────────────────

/// Payloads popped from the queue over the run.
pub const POPPED: &str = "popped";

/// Flush transactions attempted over the run.
pub const BATCHES: &str = "batches";

/// Rows committed to `system_logs` over the run.
pub const SYSTEM_ROWS: &str = "system_rows";

/// Rows committed to `model_operation_logs` over the run.
pub const MODEL_ROWS: &str = "model_rows";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
