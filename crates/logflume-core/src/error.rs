//! Error types for the logflume pipeline.

use thiserror::Error;

/// Result type alias using logflume's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for logflume operations.
///
/// Fatality is decided by the caller, not the variant: the worker treats
/// `QueueUnavailable` and `SchemaBootstrap` as fatal only during startup,
/// while `MalformedEnvelope` and `Database` are contained per-entry and
/// per-sink inside the flush loop.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Queue push/pop/inspect failed (wraps redis errors)
    #[error("Queue error: {0}")]
    Queue(String),

    /// Queue could not be reached during worker startup
    #[error("Queue unavailable: {0}")]
    QueueUnavailable(String),

    /// Sink tables/indexes could not be created
    #[error("Schema bootstrap error: {0}")]
    SchemaBootstrap(String),

    /// A queued payload failed to parse into an envelope
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure outside the pipeline's own error classes, such as a
    /// panicked worker task
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::Queue(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_queue() {
        let err = Error::Queue("connection refused".to_string());
        assert_eq!(err.to_string(), "Queue error: connection refused");
    }

    #[test]
    fn test_error_display_queue_unavailable() {
        let err = Error::QueueUnavailable("ping failed".to_string());
        assert_eq!(err.to_string(), "Queue unavailable: ping failed");
    }

    #[test]
    fn test_error_display_schema_bootstrap() {
        let err = Error::SchemaBootstrap("5 attempts exhausted".to_string());
        assert_eq!(err.to_string(), "Schema bootstrap error: 5 attempts exhausted");
    }

    #[test]
    fn test_error_display_malformed_envelope() {
        let err = Error::MalformedEnvelope("missing field `message`".to_string());
        assert_eq!(err.to_string(), "Malformed envelope: missing field `message`");
    }

    #[test]
    fn test_error_display_serialization() {
        let err = Error::Serialization("invalid JSON".to_string());
        assert_eq!(err.to_string(), "Serialization error: invalid JSON");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("DATABASE_URL is not set".to_string());
        assert_eq!(err.to_string(), "Configuration error: DATABASE_URL is not set");
    }

    #[test]
    fn test_error_display_internal() {
        let err = Error::Internal("worker task failed".to_string());
        assert_eq!(err.to_string(), "Internal error: worker task failed");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        let result = get_result();
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::Queue("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Queue"));
    }
}
