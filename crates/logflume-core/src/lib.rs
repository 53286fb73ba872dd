//! # logflume-core
//!
//! Core envelope types, traits, and abstractions for the logflume pipeline.
//!
//! This crate provides the wire format, sink row shapes, and trait seams
//! that the producer, queue, store, and worker crates depend on.

pub mod defaults;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod records;
pub mod redact;
pub mod traits;

// Re-export commonly used types at crate root
pub use envelope::{LogChannel, LogEnvelope, LogLevel, Metadata};
pub use error::{Error, Result};
pub use records::{ModelOperationLogRecord, SystemLogRecord};
pub use redact::{redact_envelope, redact_value};
pub use traits::{LogQueue, ModelOperationLogSink, SchemaBootstrap, SystemLogSink};
