#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use jsondb_cloud::ClientOptions;
use serde_json::{json, Value as JsonValue};

pub const API_KEY: &str = "jdb_sk_test_aaaaaaaaaaaaaaaa";

#[derive(Clone)]
pub struct MockResponse {
    status: StatusCode,
    body: Option<JsonValue>,
    delay: Duration,
}

impl MockResponse {
    pub fn json(status: StatusCode, body: JsonValue) -> Self {
        Self {
            status,
            body: Some(body),
            delay: Duration::from_millis(0),
        }
    }

    pub fn ok(body: JsonValue) -> Self {
        Self::json(StatusCode::OK, body)
    }

    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: None,
            delay: Duration::from_millis(0),
        }
    }

    pub fn error(status: StatusCode, code: &str, message: &str) -> Self {
        Self::json(
            status,
            json!({"error": {"code": code, "message": message, "details": {}}}),
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub method: Method,
    /// Path plus query string.
    pub uri: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn json(&self) -> JsonValue {
        serde_json::from_str(&self.body).expect("request body must be JSON")
    }
}

#[derive(Clone)]
struct MockState {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

async fn handler(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    state
        .captured
        .lock()
        .expect("capture mutex must not be poisoned")
        .push(CapturedRequest {
            method,
            uri: uri
                .path_and_query()
                .map(|value| value.as_str().to_owned())
                .unwrap_or_default(),
            headers,
            body,
        });

    let response = {
        let mut queue = state
            .responses
            .lock()
            .expect("response queue mutex must not be poisoned");
        queue.pop_front().unwrap_or_else(|| {
            MockResponse::error(
                StatusCode::NOT_IMPLEMENTED,
                "NO_MOCK",
                "no mock response available",
            )
        })
    };

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    match response.body {
        Some(body) => (response.status, Json(body)).into_response(),
        None => response.status.into_response(),
    }
}

pub struct TestServer {
    pub base_url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TestServer {
    pub fn hits(&self) -> usize {
        self.captured
            .lock()
            .expect("capture mutex must not be poisoned")
            .len()
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured
            .lock()
            .expect("capture mutex must not be poisoned")
            .clone()
    }

    pub fn last_request(&self) -> CapturedRequest {
        self.requests()
            .pop()
            .expect("server must have received a request")
    }

    /// Options pointing at this server with a fast retry schedule.
    pub fn options(&self, max_retries: usize) -> ClientOptions {
        ClientOptions::default()
            .base_url(self.base_url.clone())
            .max_retries(max_retries)
            .retry_delays_ms(1, 5)
            .timeout_ms(2_000)
    }
}

pub async fn spawn_server(responses: Vec<MockResponse>) -> TestServer {
    let state = MockState {
        responses: Arc::new(Mutex::new(responses.into())),
        captured: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new().fallback(handler).with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("mock server must run");
    });

    TestServer {
        base_url: format!("http://{address}"),
        captured: state.captured,
        task,
    }
}

pub fn doc(id: &str, fields: JsonValue) -> JsonValue {
    let mut doc = json!({
        "_id": id,
        "$createdAt": "2025-01-01T00:00:00.000Z",
        "$updatedAt": "2025-01-01T00:00:00.000Z",
        "$version": 1,
    });
    if let (Some(target), JsonValue::Object(extra)) = (doc.as_object_mut(), fields) {
        target.extend(extra);
    }
    doc
}
