//! Log envelope wire format shared by producers and the worker.
//!
//! An envelope is a flat, versionless JSON object. Producers serialize one
//! per event and push it onto the queue; the worker deserializes, routes by
//! [`LogChannel`], and shapes it into a sink row. Only `level` and `message`
//! are required on the wire; `channel` and `enqueued_at` default when
//! absent, and every other field serializes only when present, so envelopes
//! stay small and tolerant of producer-side drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Destination sink selector carried on every envelope.
///
/// A single queue transports both kinds; this field is the only routing
/// signal the worker consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogChannel {
    /// Request/response and general application events → `system_logs`.
    #[default]
    System,
    /// AI model usage events → `model_operation_logs`.
    ModelOperation,
}

impl LogChannel {
    /// Wire name for the channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogChannel::System => "system",
            LogChannel::ModelOperation => "model_operation",
        }
    }

    /// Parse a wire value. Unrecognized values fall back to `System` so an
    /// envelope is never dropped over its routing field.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "model_operation" => LogChannel::ModelOperation,
            _ => LogChannel::System,
        }
    }
}

impl<'de> Deserialize<'de> for LogChannel {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Accept any JSON value here: a non-string channel is treated the
        // same as an unknown one and routed to the system sink.
        let value = JsonValue::deserialize(deserializer)?;
        Ok(match value.as_str() {
            Some(s) => LogChannel::from_wire(s),
            None => LogChannel::System,
        })
    }
}

impl std::fmt::Display for LogChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of a log event.
///
/// Wire names are upper-case. Unlike [`LogChannel`] there is no lenient
/// fallback: an envelope with an unrecognized level is malformed and gets
/// skipped at flush time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Storage name for the level, matching the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Free-form envelope metadata.
///
/// Producers may attach a structured JSON document or a pre-serialized
/// string; both arrive intact and the worker normalizes them into a single
/// JSON document at flush time (see [`Metadata::normalize`]).
///
/// Variant order matters for the untagged representation: a JSON string
/// must land in `Raw`, everything else in `Structured`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metadata {
    Raw(String),
    Structured(JsonValue),
}

impl Metadata {
    /// Collapse into one JSON document for the sink's JSONB column.
    ///
    /// Structured values pass through unchanged. Raw strings are decoded as
    /// JSON; strings that do not decode are preserved under a reserved
    /// `"raw"` key instead of being discarded.
    pub fn normalize(self) -> JsonValue {
        match self {
            Metadata::Structured(value) => value,
            Metadata::Raw(text) => match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(_) => serde_json::json!({ "raw": text }),
            },
        }
    }
}

impl From<JsonValue> for Metadata {
    fn from(value: JsonValue) -> Self {
        Metadata::Structured(value)
    }
}

impl From<String> for Metadata {
    fn from(text: String) -> Self {
        Metadata::Raw(text)
    }
}

impl From<&str> for Metadata {
    fn from(text: &str) -> Self {
        Metadata::Raw(text.to_string())
    }
}

/// A single structured log event as carried on the queue.
///
/// Immutable once pushed. The HTTP fields are populated only by system
/// channel producers and the model usage fields only by model-operation
/// producers, but nothing enforces that on the wire; the sink row shape
/// simply ignores fields the destination table does not carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEnvelope {
    /// Routing discriminant. Missing or unrecognized values land in the
    /// system channel.
    #[serde(default)]
    pub channel: LogChannel,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub message: String,

    // Correlation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_operation_id: Option<Uuid>,

    // Timing/HTTP (system envelopes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    // Model usage (model_operation envelopes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_input: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_output: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,

    // Error details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    // Deployment tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_environment: Option<String>,

    /// When the producer enqueued the event. Informational only; the
    /// `created_at` assigned at persistence time is authoritative for
    /// ordering. Envelopes from producers that omit it are stamped at
    /// decode time instead of being rejected.
    #[serde(default = "Utc::now")]
    pub enqueued_at: DateTime<Utc>,
}

impl LogEnvelope {
    fn new(channel: LogChannel, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            channel,
            level,
            component: None,
            action: None,
            message: message.into(),
            user_id: None,
            tenant_id: None,
            request_id: None,
            model_operation_id: None,
            http_method: None,
            http_path: None,
            http_status: None,
            response_time_ms: None,
            ip_address: None,
            user_agent: None,
            model_name: None,
            tokens_input: None,
            tokens_output: None,
            latency_ms: None,
            streaming: None,
            error_type: None,
            error_message: None,
            stack_trace: None,
            metadata: None,
            deployment_version: None,
            deployment_environment: None,
            enqueued_at: Utc::now(),
        }
    }

    /// Minimal envelope on the system channel, enqueued now.
    pub fn system(level: LogLevel, message: impl Into<String>) -> Self {
        Self::new(LogChannel::System, level, message)
    }

    /// Minimal envelope on the model-operation channel, enqueued now.
    pub fn model_operation(level: LogLevel, message: impl Into<String>) -> Self {
        Self::new(LogChannel::ModelOperation, level, message)
    }

    /// Set the originating component.
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Set the logical action name.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Attach user/tenant correlation.
    pub fn with_scope(mut self, user_id: Option<Uuid>, tenant_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self.tenant_id = tenant_id;
        self
    }

    /// Attach a request correlation ID.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attach metadata (structured or raw).
    pub fn with_metadata(mut self, metadata: impl Into<Metadata>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Attach error classification.
    pub fn with_error(
        mut self,
        error_type: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        self.error_type = Some(error_type.into());
        self.error_message = Some(error_message.into());
        self
    }

    /// Stamp deployment tags.
    pub fn with_deployment(
        mut self,
        version: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        self.deployment_version = Some(version.into());
        self.deployment_environment = Some(environment.into());
        self
    }
}
