//! Bulk writer for the `system_logs` sink.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use tracing::debug;

use logflume_core::{Error, Result, SystemLogRecord, SystemLogSink};

/// PostgreSQL implementation of the system log sink.
#[derive(Clone)]
pub struct PgSystemLogSink {
    pool: PgPool,
}

impl PgSystemLogSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SystemLogSink for PgSystemLogSink {
    async fn insert_batch(&self, records: Vec<SystemLogRecord>) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let start = Instant::now();
        let count = records.len() as u64;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        for record in records {
            sqlx::query(
                "INSERT INTO system_logs (
                    level, component, action, message,
                    user_id, tenant_id, request_id,
                    http_method, http_path, http_status, response_time_ms,
                    ip_address, user_agent,
                    error_type, error_message, stack_trace,
                    metadata, deployment_version, deployment_environment,
                    enqueued_at
                 ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                           $12, $13, $14, $15, $16, $17, $18, $19, $20)",
            )
            .bind(record.level.as_str())
            .bind(&record.component)
            .bind(&record.action)
            .bind(&record.message)
            .bind(record.user_id)
            .bind(record.tenant_id)
            .bind(&record.request_id)
            .bind(&record.http_method)
            .bind(&record.http_path)
            .bind(record.http_status)
            .bind(record.response_time_ms)
            .bind(&record.ip_address)
            .bind(&record.user_agent)
            .bind(&record.error_type)
            .bind(&record.error_message)
            .bind(&record.stack_trace)
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
            sink = "system_logs",
            row_count = count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch committed"
        );
        Ok(count)
    }
}
