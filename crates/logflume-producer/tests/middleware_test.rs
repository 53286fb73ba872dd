//! Integration tests for the request logging middleware.
//!
//! Each test routes a request through an in-process router with the
//! middleware attached and asserts on the envelope that reaches the queue.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use logflume_core::{LogQueue, Result};
use logflume_producer::middleware::{record_request, RequestScope};
use logflume_producer::{LogProducer, ProducerConfig};

/// In-memory queue capturing pushed payloads.
struct CapturingQueue {
    pushes: Mutex<Vec<String>>,
}

impl CapturingQueue {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            pushes: Mutex::new(Vec::new()),
        })
    }

    async fn wait_for_one(&self) -> serde_json::Value {
        for _ in 0..100 {
            {
                let pushes = self.pushes.lock().await;
                if let Some(payload) = pushes.first() {
                    return serde_json::from_str(payload).expect("payload should be JSON");
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no envelope reached the queue");
    }
}

#[async_trait::async_trait]
impl LogQueue for CapturingQueue {
    async fn push(&self, payload: String) -> Result<()> {
        self.pushes.lock().await.push(payload);
        Ok(())
    }

    async fn pop(&self, _timeout_secs: f64) -> Result<Option<String>> {
        Ok(None)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn depth(&self) -> Result<i64> {
        Ok(self.pushes.lock().await.len() as i64)
    }
}

fn producer_with_queue() -> (LogProducer, Arc<CapturingQueue>) {
    let queue = CapturingQueue::new();
    let producer = LogProducer::start(
        Arc::clone(&queue) as Arc<dyn LogQueue>,
        ProducerConfig::default().with_workers(1),
    );
    (producer, queue)
}

fn app(producer: LogProducer) -> Router {
    Router::new()
        .route("/api/health", get(|| async { "ok" }))
        .route(
            "/api/jobs/:id",
            get(|| async { StatusCode::OK }),
        )
        .route(
            "/api/jobs",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route("/api/missing", get(|| async { StatusCode::NOT_FOUND }))
        .layer(axum::middleware::from_fn_with_state(
            producer,
            record_request,
        ))
}

#[tokio::test]
async fn test_successful_request_records_info_envelope() {
    let (producer, queue) = producer_with_queue();
    let app = app(producer);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/health")
                .header("x-request-id", "req-42")
                .header("user-agent", "logflume-test/1.0")
                .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let envelope = queue.wait_for_one().await;
    assert_eq!(envelope["channel"], "system");
    assert_eq!(envelope["level"], "INFO");
    assert_eq!(envelope["component"], "api");
    assert_eq!(envelope["message"], "GET /api/health -> 200");
    assert_eq!(envelope["http_method"], "GET");
    assert_eq!(envelope["http_path"], "/api/health");
    assert_eq!(envelope["http_status"], 200);
    assert_eq!(envelope["request_id"], "req-42");
    assert_eq!(envelope["user_agent"], "logflume-test/1.0");
    // First hop of the forwarded chain is the client.
    assert_eq!(envelope["ip_address"], "203.0.113.9");
    assert!(envelope["response_time_ms"].as_f64().unwrap() >= 0.0);
    assert!(envelope["enqueued_at"].is_string());
}

#[tokio::test]
async fn test_server_error_records_error_level() {
    let (producer, queue) = producer_with_queue();
    let app = app(producer);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/jobs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let envelope = queue.wait_for_one().await;
    assert_eq!(envelope["level"], "ERROR");
    assert_eq!(envelope["message"], "POST /api/jobs -> 500");
    assert_eq!(envelope["http_status"], 500);
}

#[tokio::test]
async fn test_client_error_records_warning_level() {
    let (producer, queue) = producer_with_queue();
    let app = app(producer);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let envelope = queue.wait_for_one().await;
    assert_eq!(envelope["level"], "WARNING");
    assert_eq!(envelope["http_status"], 404);
}

#[tokio::test]
async fn test_action_uses_route_template_not_raw_path() {
    let (producer, queue) = producer_with_queue();
    let app = app(producer);

    app.oneshot(
        Request::builder()
            .method("GET")
            .uri("/api/jobs/9f3c2a47")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let envelope = queue.wait_for_one().await;
    assert_eq!(envelope["action"], "/api/jobs/:id");
    assert_eq!(envelope["http_path"], "/api/jobs/9f3c2a47");
}

#[tokio::test]
async fn test_request_scope_from_auth_layer_is_carried() {
    let (producer, queue) = producer_with_queue();
    let user = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let tenant = Uuid::parse_str("aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee").unwrap();

    // The scope-injecting layer sits outside the recorder, the way an auth
    // middleware would in the real router.
    let app = Router::new()
        .route("/api/candidates", get(|| async { StatusCode::OK }))
        .layer(axum::middleware::from_fn_with_state(
            producer,
            record_request,
        ))
        .layer(axum::middleware::from_fn(
            move |mut req: axum::extract::Request, next: axum::middleware::Next| async move {
                req.extensions_mut()
                    .insert(RequestScope::new(Some(user), Some(tenant)));
                next.run(req).await
            },
        ));

    app.oneshot(
        Request::builder()
            .method("GET")
            .uri("/api/candidates")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let envelope = queue.wait_for_one().await;
    assert_eq!(envelope["user_id"], user.to_string());
    assert_eq!(envelope["tenant_id"], tenant.to_string());
}

#[tokio::test]
async fn test_anonymous_request_has_no_scope_fields() {
    let (producer, queue) = producer_with_queue();
    let app = app(producer);

    app.oneshot(
        Request::builder()
            .method("GET")
            .uri("/api/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let envelope = queue.wait_for_one().await;
    assert!(envelope.get("user_id").is_none());
    assert!(envelope.get("tenant_id").is_none());
}
