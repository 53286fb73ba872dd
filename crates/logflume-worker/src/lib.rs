//! # logflume-worker
//!
//! Queue consumer daemon for logflume.
//!
//! This crate provides:
//! - A bootstrap phase that verifies queue reachability and creates the
//!   sink schema, with bounded fixed-delay retries
//! - A batching flush loop (size and interval triggered) feeding the two
//!   sink tables in independent transactions
//! - Graceful drain on shutdown with a run summary
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use logflume_db::LogStore;
//! use logflume_queue::{QueueConfig, RedisLogQueue};
//! use logflume_worker::{LogWorker, WorkerConfig};
//!
//! let store = LogStore::connect("postgres://...").await?;
//! let queue = RedisLogQueue::connect(&QueueConfig::from_env()).await?;
//!
//! let worker = LogWorker::new(
//!     Arc::new(queue),
//!     Arc::new(store.clone()),
//!     Arc::new(store.system.clone()),
//!     Arc::new(store.model_operations.clone()),
//!     WorkerConfig::from_env(),
//! );
//! let handle = worker.start();
//!
//! // ... on SIGTERM:
//! let stats = handle.shutdown().await?;
//! println!("persisted {} rows", stats.system_rows + stats.model_rows);
//! ```

pub mod config;
pub mod flush;
pub mod worker;

// Re-export core types
pub use logflume_core::*;

pub use config::WorkerConfig;
pub use flush::{flush_batch, FlushOutcome};
pub use worker::{LogWorker, WorkerHandle, WorkerState, WorkerStats};
