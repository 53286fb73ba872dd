//! Request logging middleware.
//!
//! Layered onto an axum router with `from_fn_with_state`, this records one
//! system-channel envelope per completed request: method, path, status,
//! latency, and client details. Severity follows the response status so
//! failures surface in the sinks without any handler changes.

use std::time::Instant;

use axum::extract::{MatchedPath, State};
use axum::http::header::USER_AGENT;
use axum::http::StatusCode;
use uuid::Uuid;

use logflume_core::{LogEnvelope, LogLevel};

use crate::producer::LogProducer;

/// Header carrying the caller-supplied request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header carrying the original client address behind a proxy.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Identity attached to a request by an upstream auth layer.
///
/// When present in request extensions, the recorded envelope carries the
/// user and tenant so log rows can be correlated per account.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestScope {
    pub user_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
}

impl RequestScope {
    pub fn new(user_id: Option<Uuid>, tenant_id: Option<Uuid>) -> Self {
        Self { user_id, tenant_id }
    }
}

/// Map a response status onto an envelope severity.
///
/// Server errors are `ERROR`, client errors `WARNING`, everything else
/// (including redirects) `INFO`.
fn level_for_status(status: StatusCode) -> LogLevel {
    if status.is_server_error() {
        LogLevel::Error
    } else if status.is_client_error() {
        LogLevel::Warning
    } else {
        LogLevel::Info
    }
}

/// Record one envelope per completed request.
///
/// Attach with the producer as layer state:
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/api/jobs", post(create_job))
///     .layer(axum::middleware::from_fn_with_state(
///         producer.clone(),
///         logflume_producer::middleware::record_request,
///     ));
/// ```
pub async fn record_request(
    State(producer): State<LogProducer>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    // The route template ("/api/jobs/:id") names the action; the raw path
    // would explode cardinality with every distinct id.
    let action = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let scope = request
        .extensions()
        .get::<RequestScope>()
        .copied()
        .unwrap_or_default();
    let request_id = header_value(&request, REQUEST_ID_HEADER);
    let ip_address = header_value(&request, FORWARDED_FOR_HEADER)
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()));
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let start = Instant::now();
    let response = next.run(request).await;
    let status = response.status();

    let mut envelope = LogEnvelope::system(
        level_for_status(status),
        format!("{} {} -> {}", method, path, status.as_u16()),
    )
    .with_component("api")
    .with_action(action)
    .with_scope(scope.user_id, scope.tenant_id);
    envelope.request_id = request_id;
    envelope.http_method = Some(method);
    envelope.http_path = Some(path);
    envelope.http_status = Some(status.as_u16() as i32);
    envelope.response_time_ms = Some(start.elapsed().as_secs_f64() * 1000.0);
    envelope.ip_address = ip_address;
    envelope.user_agent = user_agent;

    producer.record(envelope);

    response
}

fn header_value(request: &axum::extract::Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
