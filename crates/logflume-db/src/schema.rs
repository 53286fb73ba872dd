//! Idempotent sink schema creation.
//!
//! The worker owns the two log tables outright; nothing else in the
//! platform writes them, so their DDL lives here next to the code that
//! needs it instead of in a migration chain. Every statement is guarded
//! with `IF NOT EXISTS`, which makes a re-run a no-op and keeps multiple
//! worker instances racing at first start safe: a loser of a rare
//! creation race gets a transient error and the caller's bootstrap retry
//! covers it.

use std::time::Instant;

use sqlx::postgres::PgPool;
use tracing::info;

use logflume_core::{Error, Result};

/// DDL statements executed in order, one per round trip.
const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS system_logs (
        id BIGSERIAL PRIMARY KEY,
        level TEXT NOT NULL,
        component TEXT,
        action TEXT,
        message TEXT NOT NULL,
        user_id UUID,
        tenant_id UUID,
        request_id TEXT,
        http_method TEXT,
        http_path TEXT,
        http_status INTEGER,
        response_time_ms DOUBLE PRECISION,
        ip_address TEXT,
        user_agent TEXT,
        error_type TEXT,
        error_message TEXT,
        stack_trace TEXT,
        metadata JSONB,
        deployment_version TEXT,
        deployment_environment TEXT,
        enqueued_at TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS model_operation_logs (
        id BIGSERIAL PRIMARY KEY,
        level TEXT NOT NULL,
        action TEXT,
        message TEXT NOT NULL,
        user_id UUID,
        tenant_id UUID,
        model_operation_id UUID,
        model_name TEXT,
        tokens_input INTEGER,
        tokens_output INTEGER,
        latency_ms DOUBLE PRECISION,
        streaming BOOLEAN,
        error_type TEXT,
        error_message TEXT,
        metadata JSONB,
        deployment_version TEXT,
        deployment_environment TEXT,
        enqueued_at TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS idx_system_logs_level_created
        ON system_logs (level, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_system_logs_component_created
        ON system_logs (component, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_system_logs_errors
        ON system_logs (created_at DESC) WHERE error_type IS NOT NULL",
    "CREATE INDEX IF NOT EXISTS idx_model_operation_logs_level_created
        ON model_operation_logs (level, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_model_operation_logs_model_created
        ON model_operation_logs (model_name, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_model_operation_logs_errors
        ON model_operation_logs (created_at DESC) WHERE error_type IS NOT NULL",
];

/// Create both sink tables and their indexes if absent.
///
/// Safe to call on every worker start and from concurrent instances.
/// Row data in existing tables is never touched.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    let start = Instant::now();

    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }

    info!(
        subsystem = "database",
        component = "bootstrap",
        op = "ensure_schema",
        statement_count = SCHEMA_STATEMENTS.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Sink schema ensured"
    );
    Ok(())
}
