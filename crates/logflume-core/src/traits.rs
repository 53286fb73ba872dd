//! Core traits for logflume abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability. The worker
//! loop is written against them so its state machine can be exercised
//! with in-memory doubles.

use async_trait::async_trait;

use crate::error::Result;
use crate::records::{ModelOperationLogRecord, SystemLogRecord};

/// Transport carrying serialized envelopes from producers to workers.
#[async_trait]
pub trait LogQueue: Send + Sync {
    /// Append a serialized envelope to the tail of the queue.
    async fn push(&self, payload: String) -> Result<()>;

    /// Remove and return the head payload, blocking up to `timeout_secs`.
    /// Returns `Ok(None)` when the timeout elapses on an empty queue.
    async fn pop(&self, timeout_secs: f64) -> Result<Option<String>>;

    /// Round-trip reachability probe.
    async fn ping(&self) -> Result<()>;

    /// Number of payloads currently waiting.
    async fn depth(&self) -> Result<i64>;
}

/// One-time sink schema setup run during worker bootstrap.
#[async_trait]
pub trait SchemaBootstrap: Send + Sync {
    /// Create both sink tables and their indexes if absent. Idempotent and
    /// safe to race from multiple worker instances starting concurrently.
    async fn ensure_schema(&self) -> Result<()>;
}

/// Bulk writer for the `system_logs` sink.
#[async_trait]
pub trait SystemLogSink: Send + Sync {
    /// Insert the batch in a single transaction, returning the row count.
    /// All rows land or none do.
    async fn insert_batch(&self, records: Vec<SystemLogRecord>) -> Result<u64>;
}

/// Bulk writer for the `model_operation_logs` sink.
#[async_trait]
pub trait ModelOperationLogSink: Send + Sync {
    /// Insert the batch in a single transaction, returning the row count.
    /// All rows land or none do.
    async fn insert_batch(&self, records: Vec<ModelOperationLogRecord>) -> Result<u64>;
}
