//! Sink row shapes and the envelope-to-row mapping.
//!
//! One struct per sink table, carrying exactly the columns that table
//! persists (minus the server-assigned `id` and `created_at`). The `From`
//! conversions normalize metadata and drop the fields the destination
//! table does not carry.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::envelope::{LogEnvelope, LogLevel, Metadata};

/// Row shape for the `system_logs` sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemLogRecord {
    pub level: LogLevel,
    pub component: Option<String>,
    pub action: Option<String>,
    pub message: String,
    pub user_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub request_id: Option<String>,
    pub http_method: Option<String>,
    pub http_path: Option<String>,
    pub http_status: Option<i32>,
    pub response_time_ms: Option<f64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub stack_trace: Option<String>,
    pub metadata: Option<JsonValue>,
    pub deployment_version: Option<String>,
    pub deployment_environment: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

impl From<LogEnvelope> for SystemLogRecord {
    fn from(envelope: LogEnvelope) -> Self {
        Self {
            level: envelope.level,
            component: envelope.component,
            action: envelope.action,
            message: envelope.message,
            user_id: envelope.user_id,
            tenant_id: envelope.tenant_id,
            request_id: envelope.request_id,
            http_method: envelope.http_method,
            http_path: envelope.http_path,
            http_status: envelope.http_status,
            response_time_ms: envelope.response_time_ms,
            ip_address: envelope.ip_address,
            user_agent: envelope.user_agent,
            error_type: envelope.error_type,
            error_message: envelope.error_message,
            stack_trace: envelope.stack_trace,
            metadata: envelope.metadata.map(Metadata::normalize),
            deployment_version: envelope.deployment_version,
            deployment_environment: envelope.deployment_environment,
            enqueued_at: envelope.enqueued_at,
        }
    }
}

/// Row shape for the `model_operation_logs` sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOperationLogRecord {
    pub level: LogLevel,
    pub action: Option<String>,
    pub message: String,
    pub user_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub model_operation_id: Option<Uuid>,
    pub model_name: Option<String>,
    pub tokens_input: Option<i32>,
    pub tokens_output: Option<i32>,
    pub latency_ms: Option<f64>,
    pub streaming: Option<bool>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub metadata: Option<JsonValue>,
    pub deployment_version: Option<String>,
    pub deployment_environment: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

impl From<LogEnvelope> for ModelOperationLogRecord {
    fn from(envelope: LogEnvelope) -> Self {
        Self {
            level: envelope.level,
            action: envelope.action,
            message: envelope.message,
            user_id: envelope.user_id,
            tenant_id: envelope.tenant_id,
            model_operation_id: envelope.model_operation_id,
            model_name: envelope.model_name,
            tokens_input: envelope.tokens_input,
            tokens_output: envelope.tokens_output,
            latency_ms: envelope.latency_ms,
            streaming: envelope.streaming,
            error_type: envelope.error_type,
            error_message: envelope.error_message,
            metadata: envelope.metadata.map(Metadata::normalize),
            deployment_version: envelope.deployment_version,
            deployment_environment: envelope.deployment_environment,
            enqueued_at: envelope.enqueued_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::LogChannel;
    use serde_json::json;

    fn system_envelope() -> LogEnvelope {
        let mut envelope = LogEnvelope::system(LogLevel::Error, "request failed")
            .with_component("api")
            .with_action("post_job")
            .with_metadata(json!({"attempt": 2}));
        envelope.http_method = Some("POST".to_string());
        envelope.http_path = Some("/api/jobs".to_string());
        envelope.http_status = Some(500);
        envelope.response_time_ms = Some(182.4);
        envelope
    }

    #[test]
    fn system_record_carries_http_fields() {
        let envelope = system_envelope();
        let enqueued_at = envelope.enqueued_at;
        let record = SystemLogRecord::from(envelope);
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.component.as_deref(), Some("api"));
        assert_eq!(record.http_status, Some(500));
        assert_eq!(record.metadata, Some(json!({"attempt": 2})));
        assert_eq!(record.enqueued_at, enqueued_at);
    }

    #[test]
    fn model_record_drops_http_and_component_fields() {
        let mut envelope = LogEnvelope::model_operation(LogLevel::Info, "embedding generated")
            .with_action("generate_embedding")
            .with_metadata(json!({"tokens": 120}));
        envelope.model_name = Some("nomic-embed-text".to_string());
        envelope.tokens_input = Some(120);
        envelope.latency_ms = Some(33.0);

        assert_eq!(envelope.channel, LogChannel::ModelOperation);
        let record = ModelOperationLogRecord::from(envelope);
        assert_eq!(record.model_name.as_deref(), Some("nomic-embed-text"));
        assert_eq!(record.tokens_input, Some(120));
        assert_eq!(record.metadata, Some(json!({"tokens": 120})));
    }

    #[test]
    fn conversion_normalizes_raw_metadata() {
        let envelope =
            LogEnvelope::system(LogLevel::Info, "cache miss").with_metadata("{\"key\": \"jobs:7\"}");
        let record = SystemLogRecord::from(envelope);
        assert_eq!(record.metadata, Some(json!({"key": "jobs:7"})));
    }

    #[test]
    fn conversion_wraps_plain_string_metadata() {
        let envelope = LogEnvelope::system(LogLevel::Info, "cache miss").with_metadata("plain note");
        let record = SystemLogRecord::from(envelope);
        assert_eq!(record.metadata, Some(json!({"raw": "plain note"})));
    }

    #[test]
    fn absent_metadata_stays_absent() {
        let record = SystemLogRecord::from(LogEnvelope::system(LogLevel::Debug, "tick"));
        assert_eq!(record.metadata, None);
    }
}
