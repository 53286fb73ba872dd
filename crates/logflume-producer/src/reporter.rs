//! Model usage reporting.
//!
//! AI call sites wrap each model invocation in a [`ModelOperation`] guard:
//! `begin` captures the clock and a fresh operation id, `succeeded` or
//! `failed` turns the guard into a model-channel envelope with usage and
//! latency filled in. One model call, one envelope.

use std::time::Instant;

use serde_json::Value as JsonValue;
use uuid::Uuid;

use logflume_core::{LogEnvelope, LogLevel};

use crate::producer::LogProducer;

/// Records model-operation envelopes through a shared producer.
#[derive(Clone)]
pub struct ModelOperationReporter {
    producer: LogProducer,
}

impl ModelOperationReporter {
    pub fn new(producer: LogProducer) -> Self {
        Self { producer }
    }

    /// Start timing a model call.
    ///
    /// `action` names the operation ("generate_embedding", "draft_posting"),
    /// `model_name` the model that serves it.
    pub fn begin(
        &self,
        action: impl Into<String>,
        model_name: impl Into<String>,
    ) -> ModelOperation {
        ModelOperation {
            producer: self.producer.clone(),
            action: action.into(),
            model_name: model_name.into(),
            // Time-ordered id so rows for one operation cluster in the index.
            model_operation_id: Uuid::now_v7(),
            user_id: None,
            tenant_id: None,
            streaming: None,
            metadata: None,
            started: Instant::now(),
        }
    }
}

/// In-flight model call; consumed by [`succeeded`](Self::succeeded) or
/// [`failed`](Self::failed).
pub struct ModelOperation {
    producer: LogProducer,
    action: String,
    model_name: String,
    model_operation_id: Uuid,
    user_id: Option<Uuid>,
    tenant_id: Option<Uuid>,
    streaming: Option<bool>,
    metadata: Option<JsonValue>,
    started: Instant,
}

impl ModelOperation {
    /// Correlation id for this operation, for echoing into API responses.
    pub fn id(&self) -> Uuid {
        self.model_operation_id
    }

    /// Attach the requesting user and tenant.
    pub fn with_scope(mut self, user_id: Option<Uuid>, tenant_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self.tenant_id = tenant_id;
        self
    }

    /// Mark whether the response was streamed.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = Some(streaming);
        self
    }

    /// Attach structured context (prompt template, temperature, chunk count).
    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Record a completed call with its token usage.
    pub fn succeeded(self, tokens_input: i32, tokens_output: i32) {
        let mut envelope = self.envelope(
            LogLevel::Info,
            format!("{} completed", self.action),
        );
        envelope.tokens_input = Some(tokens_input);
        envelope.tokens_output = Some(tokens_output);
        self.producer.record(envelope);
    }

    /// Record a failed call. Token counts are usually unknown at this point
    /// and stay unset.
    pub fn failed(self, error_type: impl Into<String>, error_message: impl Into<String>) {
        let envelope = self
            .envelope(LogLevel::Error, format!("{} failed", self.action))
            .with_error(error_type, error_message);
        self.producer.record(envelope);
    }

    fn envelope(&self, level: LogLevel, message: String) -> LogEnvelope {
        let mut envelope = LogEnvelope::model_operation(level, message)
            .with_action(self.action.clone())
            .with_scope(self.user_id, self.tenant_id);
        envelope.model_operation_id = Some(self.model_operation_id);
        envelope.model_name = Some(self.model_name.clone());
        envelope.latency_ms = Some(self.started.elapsed().as_secs_f64() * 1000.0);
        envelope.streaming = self.streaming;
        if let Some(metadata) = &self.metadata {
            envelope = envelope.with_metadata(metadata.clone());
        }
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::test_support::CapturingQueue;
    use crate::producer::ProducerConfig;
    use logflume_core::LogQueue;
    use std::sync::Arc;

    fn reporter_with_queue() -> (ModelOperationReporter, Arc<CapturingQueue>) {
        let queue = CapturingQueue::new();
        let producer = LogProducer::start(
            Arc::clone(&queue) as Arc<dyn LogQueue>,
            ProducerConfig::default().with_workers(1),
        );
        (ModelOperationReporter::new(producer), queue)
    }

    #[tokio::test]
    async fn test_succeeded_records_usage_on_model_channel() {
        let (reporter, queue) = reporter_with_queue();

        let op = reporter.begin("generate_embedding", "nomic-embed-text-v1.5");
        let op_id = op.id();
        op.with_streaming(false).succeeded(120, 0);

        let pushes = queue.wait_for(1).await;
        let value: serde_json::Value = serde_json::from_str(&pushes[0]).unwrap();
        assert_eq!(value["channel"], "model_operation");
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["action"], "generate_embedding");
        assert_eq!(value["model_name"], "nomic-embed-text-v1.5");
        assert_eq!(value["model_operation_id"], op_id.to_string());
        assert_eq!(value["tokens_input"], 120);
        assert_eq!(value["tokens_output"], 0);
        assert_eq!(value["streaming"], false);
        assert!(value["latency_ms"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn test_failed_records_error_without_usage() {
        let (reporter, queue) = reporter_with_queue();

        reporter
            .begin("draft_posting", "claude-sonnet")
            .failed("UpstreamTimeout", "model gateway timed out after 30s");

        let pushes = queue.wait_for(1).await;
        let value: serde_json::Value = serde_json::from_str(&pushes[0]).unwrap();
        assert_eq!(value["channel"], "model_operation");
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["error_type"], "UpstreamTimeout");
        assert_eq!(value["error_message"], "model gateway timed out after 30s");
        assert!(value.get("tokens_input").is_none());
    }

    #[tokio::test]
    async fn test_metadata_and_scope_carried() {
        let (reporter, queue) = reporter_with_queue();
        let user = Uuid::now_v7();
        let tenant = Uuid::now_v7();

        reporter
            .begin("score_candidate", "claude-haiku")
            .with_scope(Some(user), Some(tenant))
            .with_metadata(serde_json::json!({ "temperature": 0.2, "rubric": "v3" }))
            .succeeded(800, 64);

        let pushes = queue.wait_for(1).await;
        let value: serde_json::Value = serde_json::from_str(&pushes[0]).unwrap();
        assert_eq!(value["user_id"], user.to_string());
        assert_eq!(value["tenant_id"], tenant.to_string());
        assert_eq!(value["metadata"]["temperature"], 0.2);
        assert_eq!(value["metadata"]["rubric"], "v3");
    }

    #[tokio::test]
    async fn test_each_operation_gets_distinct_id() {
        let (reporter, _queue) = reporter_with_queue();
        let a = reporter.begin("generate_embedding", "m").id();
        let b = reporter.begin("generate_embedding", "m").id();
        assert_ne!(a, b);
    }
}
