//! Shared harness: the relay router wired against wiremock upstreams.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use relay_service::{build_router, config::RelayConfig, AppState};
use secrecy::Secret;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::MockServer;

pub const GEMINI_KEY: &str = "test-gemini-key";
pub const OPENAI_KEY: &str = "test-openai-key";
pub const MAPS_KEY: &str = "test-maps-key";
pub const GEMINI_PATH: &str = "/models/gemini-1.5-flash:generateContent";

/// Which upstream keys the app under test is configured with.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keys {
    pub gemini: bool,
    pub openai: bool,
    pub maps: bool,
}

impl Keys {
    pub fn all() -> Self {
        Self {
            gemini: true,
            openai: true,
            maps: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub gemini: MockServer,
    pub openai: MockServer,
    pub maps: MockServer,
}

pub async fn spawn_app(keys: Keys) -> TestApp {
    build_app(keys, None).await
}

/// Same wiring, but every upstream base points at a port nothing listens on.
pub async fn spawn_unreachable_app(keys: Keys) -> TestApp {
    build_app(keys, Some(closed_port_uri())).await
}

fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

async fn build_app(keys: Keys, base_override: Option<String>) -> TestApp {
    let gemini = MockServer::start().await;
    let openai = MockServer::start().await;
    let maps = MockServer::start().await;

    let secret = |enabled: bool, key: &str| enabled.then(|| Secret::new(key.to_string()));
    let base = |server: &MockServer| base_override.clone().unwrap_or_else(|| server.uri());

    let mut config = RelayConfig::default();
    config.gemini.api_key = secret(keys.gemini, GEMINI_KEY);
    config.gemini.api_base = base(&gemini);
    config.openai.api_key = secret(keys.openai, OPENAI_KEY);
    config.openai.api_base = base(&openai);
    config.google_maps.api_key = secret(keys.maps, MAPS_KEY);
    config.google_maps.api_base = base(&maps);

    TestApp {
        router: build_router(AppState::new(config)),
        gemini,
        openai,
        maps,
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_empty(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }
}

/// Number of requests a mock upstream has received.
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

pub fn gemini_success(text: &str) -> Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 42, "candidatesTokenCount": 12 }
    })
}

pub fn openai_success(text: &str) -> Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }]
    })
}
