//! Batch flush: parse, partition, persist.
//!
//! Payloads are parsed one at a time so a single malformed entry never
//! poisons its batch. Parsed envelopes split by channel into the two sink
//! tables, and each sink gets its own transaction: a failed system insert
//! does not touch model rows and vice versa. There is no retry and no
//! dead-letter store; a failed batch is logged and gone.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error};

use logflume_core::records::{ModelOperationLogRecord, SystemLogRecord};
use logflume_core::{
    Error, LogChannel, LogEnvelope, ModelOperationLogSink, Result, SystemLogSink,
};

/// What one flush accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    /// Rows committed to `system_logs`.
    pub system_rows: u64,
    /// Rows committed to `model_operation_logs`.
    pub model_rows: u64,
    /// Payloads that failed to parse and were skipped.
    pub skipped: u64,
    /// Sinks whose transaction failed (0, 1, or 2).
    pub sink_failures: u64,
}

fn parse_envelope(payload: &str) -> Result<LogEnvelope> {
    serde_json::from_str(payload).map_err(|e| Error::MalformedEnvelope(e.to_string()))
}

/// First characters of a payload for log output.
fn snippet(payload: &str) -> String {
    payload.chars().take(160).collect()
}

/// Split raw payloads into per-sink record batches.
///
/// Returns the system records, the model records, and how many payloads
/// were skipped as malformed.
fn partition(payloads: Vec<String>) -> (Vec<SystemLogRecord>, Vec<ModelOperationLogRecord>, u64) {
    let mut system = Vec::new();
    let mut model = Vec::new();
    let mut skipped = 0u64;

    for payload in payloads {
        match parse_envelope(&payload) {
            Ok(envelope) => match envelope.channel {
                LogChannel::System => system.push(envelope.into()),
                LogChannel::ModelOperation => model.push(envelope.into()),
            },
            Err(e) => {
                skipped += 1;
                error!(
                    subsystem = "worker",
                    error = %e,
                    payload = %snippet(&payload),
                    "Skipping malformed envelope"
                );
            }
        }
    }

    (system, model, skipped)
}

/// Persist one buffered batch.
///
/// Never returns an error: malformed entries and sink failures are counted
/// in the outcome and the worker keeps running either way.
pub async fn flush_batch(
    system_sink: &Arc<dyn SystemLogSink>,
    model_sink: &Arc<dyn ModelOperationLogSink>,
    payloads: Vec<String>,
) -> FlushOutcome {
    let batch_len = payloads.len();
    let started = Instant::now();

    let (system, model, skipped) = partition(payloads);
    let mut outcome = FlushOutcome {
        skipped,
        ..Default::default()
    };

    if !system.is_empty() {
        let rows = system.len();
        match system_sink.insert_batch(system).await {
            Ok(inserted) => outcome.system_rows = inserted,
            Err(e) => {
                outcome.sink_failures += 1;
                error!(
                    subsystem = "worker",
                    sink = "system_logs",
                    dropped = rows,
                    error = %e,
                    "Batch insert failed, rows in this batch are lost"
                );
            }
        }
    }

    if !model.is_empty() {
        let rows = model.len();
        match model_sink.insert_batch(model).await {
            Ok(inserted) => outcome.model_rows = inserted,
            Err(e) => {
                outcome.sink_failures += 1;
                error!(
                    subsystem = "worker",
                    sink = "model_operation_logs",
                    dropped = rows,
                    error = %e,
                    "Batch insert failed, rows in this batch are lost"
                );
            }
        }
    }

    debug!(
        subsystem = "worker",
        batch_len,
        system_rows = outcome.system_rows,
        model_rows = outcome.model_rows,
        skipped = outcome.skipped,
        duration_ms = started.elapsed().as_millis() as u64,
        "Flush complete"
    );

    outcome
}
