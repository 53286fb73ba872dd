//! Bulk writer for the `model_operation_logs` sink.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use tracing::debug;

use logflume_core::{Error, ModelOperationLogRecord, ModelOperationLogSink, Result};

/// PostgreSQL implementation of the model operation log sink.
#[derive(Clone)]
pub struct PgModelOperationLogSink {
    pool: PgPool,
}

impl PgModelOperationLogSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModelOperationLogSink for PgModelOperationLogSink {
    async fn insert_batch(&self, records: Vec<ModelOperationLogRecord>) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let start = Instant::now();
        let count = records.len() as u64;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        for record in records {
            sqlx::query(
                "INSERT INTO model_operation_logs (
                    level, action, message,
                    user_id, tenant_id, model_operation_id,
                    model_name, tokens_input, tokens_output, latency_ms, streaming,
                    error_type, error_message,
                    metadata, deployment_version, deployment_environment,
                    enqueued_at
                 ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                           $12, $13, $14, $15, $16, $17)",
            )
            .bind(record.level.as_str())
            .bind(&record.action)
            .bind(&record.message)
            .bind(record.user_id)
            .bind(record.tenant_id)
            .bind(record.model_operation_id)
            .bind(&record.model_name)
            .bind(record.tokens_input)
            .bind(record.tokens_output)
            .bind(record.latency_ms)
            .bind(record.streaming)
            .bind(&record.error_type)
            .bind(&record.error_message)
            .bind(&record.metadata)
            .bind(&record.deployment_version)
            .bind(&record.deployment_environment)
            .bind(record.enqueued_at)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            sink = "model_operation_logs",
            row_count = count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch committed"
        );
        Ok(count)
    }
}
