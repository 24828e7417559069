#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use ohm_api::config::ServerConfig;
use ohm_api::router::build_app_router;
use ohm_api::state::AppState;
use ohm_core::circuit::CircuitJson;
use ohm_core::types::DbId;
use ohm_db::models::artifact_version::{ArtifactVersion, CreateArtifactVersion};
use ohm_db::repositories::ArtifactVersionRepo;
use ohm_render::{DiagramGenerator, RenderError};
use ohm_worker::{PgDiagramStore, ProcessorConfig, QueueProcessor};

/// Bearer secret accepted by apps built with [`test_config`].
pub const CRON_SECRET: &str = "test-cron-secret";

/// Circuits with this title fail to render.
pub const FAILING_TITLE: &str = "explode";

/// Build a test `ServerConfig` with safe defaults and a known cron secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        cron_secret: Some(CRON_SECRET.to_string()),
        scheduler_enabled: false,
    }
}

/// Generator that returns a numbered URL, or fails for [`FAILING_TITLE`].
#[derive(Default)]
pub struct FakeGenerator {
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiagramGenerator for FakeGenerator {
    async fn generate(&self, circuit: &CircuitJson) -> Result<String, RenderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if circuit.title.as_deref() == Some(FAILING_TITLE) {
            return Err(RenderError::ApiError {
                status: 500,
                body: "model crashed".to_string(),
            });
        }
        Ok(format!("https://img.test/{n}.png"))
    }
}

/// Full application router over `pool` with a [`FakeGenerator`] and the
/// default processor tuning (1s pacing, which wait estimates depend on).
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config(), Arc::new(FakeGenerator::default()))
}

/// Same as [`build_test_app`] with explicit config and generator.
pub fn build_test_app_with(
    pool: PgPool,
    config: ServerConfig,
    generator: Arc<FakeGenerator>,
) -> Router {
    let processor = QueueProcessor::new(
        Arc::new(PgDiagramStore::new(pool.clone())),
        generator,
        ProcessorConfig::default(),
    );
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        processor: Arc::new(processor),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Call the cron endpoint with an optional bearer token.
pub async fn cron(app: Router, method: Method, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri("/api/v1/cron/process-diagrams");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn new_artifact(pool: &PgPool) -> ArtifactVersion {
    ArtifactVersionRepo::create(
        pool,
        &CreateArtifactVersion {
            chat_id: uuid::Uuid::new_v4(),
            version: None,
        },
    )
    .await
    .unwrap()
}

/// A small valid circuit whose wiring varies with `pin`.
pub fn circuit(pin: &str) -> Value {
    json!({
        "title": "Blinky",
        "components": [
            {"id": "u1", "type": "arduino-uno", "label": "Arduino Uno"},
            {"id": "d1", "type": "led", "value": "red"}
        ],
        "connections": [{"from": format!("u1.{pin}"), "to": "d1", "color": "red"}]
    })
}

pub fn enqueue_body(artifact: &ArtifactVersion, circuit: Value) -> Value {
    json!({
        "circuitJson": circuit,
        "artifactId": artifact.id,
        "chatId": artifact.chat_id,
    })
}

/// Submit `circuit` for `artifact` and return the job id.
pub async fn enqueue(app: Router, artifact: &ArtifactVersion, circuit: Value) -> DbId {
    let response = post_json(app, "/api/v1/diagrams", enqueue_body(artifact, circuit)).await;
    assert_eq!(response.status(), axum::http::StatusCode::ACCEPTED);
    body_json(response).await["jobId"].as_i64().unwrap()
}
