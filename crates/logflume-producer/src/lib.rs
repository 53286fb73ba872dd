//! # logflume-producer
//!
//! Application-side log emission for logflume.
//!
//! This crate provides:
//! - A fire-and-forget [`LogProducer`] that redacts, serializes, and queues
//!   envelopes off the caller's critical path
//! - An axum middleware that records one system envelope per request
//! - A [`ModelOperationReporter`] for per-call AI usage envelopes
//!
//! ## Example
//!
//! ```ignore
//! use logflume_producer::{LogProducer, ModelOperationReporter};
//! use logflume_core::{LogEnvelope, LogLevel};
//!
//! let producer = LogProducer::from_env().await;
//!
//! // Anywhere in request handling:
//! producer.record(
//!     LogEnvelope::system(LogLevel::Info, "job posting published")
//!         .with_component("jobs")
//!         .with_action("publish_posting"),
//! );
//!
//! // Around a model call:
//! let reporter = ModelOperationReporter::new(producer.clone());
//! let op = reporter.begin("generate_embedding", "nomic-embed-text-v1.5");
//! // ... call the model ...
//! op.succeeded(120, 0);
//! ```

pub mod middleware;
pub mod producer;
pub mod reporter;

// Re-export core types
pub use logflume_core::*;

pub use middleware::{record_request, RequestScope};
pub use producer::{LogProducer, ProducerConfig};
pub use reporter::{ModelOperation, ModelOperationReporter};
