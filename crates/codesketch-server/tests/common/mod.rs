//! Shared fixtures for server integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode},
};
use codesketch_core::{GatewayError, GenerationParams, InteractionStore, ModelGateway, TextGeneration};
use codesketch_server::{config::Config, routes, state::AppState};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const FIB_CODE: &str = "def fib(n):\n    if n < 2:\n        return n\n    return fib(n - 1) + fib(n - 2)\n";

/// PNG signature followed by a few filler bytes.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

/// In-process model gateway returning canned outputs.
pub struct StubGateway {
    pub code: String,
    pub image: Vec<u8>,
    pub fail_text: bool,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl StubGateway {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            image: PNG_BYTES.to_vec(),
            fail_text: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_text: true,
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelGateway for StubGateway {
    async fn generate_text(
        &self,
        model_id: &str,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<TextGeneration, GatewayError> {
        self.calls.lock().unwrap().push((model_id.to_string(), prompt.to_string()));
        if self.fail_text {
            return Err(GatewayError::Status {
                status: 503,
                body: "model is loading".to_string(),
            });
        }
        let raw = serde_json::json!([{ "generated_text": self.code }]);
        Ok(serde_json::from_value(raw).unwrap())
    }

    async fn generate_image(&self, model_id: &str, prompt: &str) -> Result<Vec<u8>, GatewayError> {
        self.calls.lock().unwrap().push((model_id.to_string(), prompt.to_string()));
        Ok(self.image.clone())
    }
}

pub fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        db_path: temp_dir.path().join("test.db"),
        code_model_id: "test/code-model".to_string(),
        diffusion_model_id: "test/diagram-model".to_string(),
        ..Config::default()
    }
}

/// Full router over a temp database and the given gateway.
pub fn create_test_app(gateway: Arc<StubGateway>) -> (Router, Arc<AppState>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);
    let store = Arc::new(InteractionStore::open(&config.db_path).unwrap());
    let state = Arc::new(AppState::with_gateway(config, store, gateway));
    (routes::router(state.clone()), state, temp_dir)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Issue a generate call and assert it succeeded.
pub async fn generate_ok(app: &Router, prompt: &str, session_id: &str) -> serde_json::Value {
    let response = send(
        app,
        post_json(
            "/api/generate",
            serde_json::json!({ "prompt": prompt, "session_id": session_id }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}
