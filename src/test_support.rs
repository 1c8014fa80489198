//! In-process stand-in for the smart-home REST API.
//!
//! Canned responses are keyed by `(METHOD, path_and_query)`; every request is
//! recorded so tests can assert on method, bearer header and JSON body.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
pub struct StubApi {
    responses: Arc<Mutex<HashMap<(String, String), (StatusCode, Value)>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    delays: Arc<Mutex<HashMap<(String, String), Duration>>>,
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_owned()), (status, body));
        self
    }

    pub fn ok(&self, method: Method, path: &str, body: Value) -> &Self {
        self.respond(method, path, StatusCode::OK, body)
    }

    /// Hold the response for `method path` back by `delay`. The request is
    /// recorded as soon as it arrives.
    pub fn delay(&self, method: Method, path: &str, delay: Duration) -> &Self {
        self.delays
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_owned()), delay);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Bind to an ephemeral port and serve in the background.
    /// Returns the base URL to hand to `ApiClient`.
    pub async fn spawn(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

async fn handle(
    State(stub): State<StubApi>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| uri.path().to_owned());

    stub.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body: serde_json::from_slice(&body).ok(),
    });

    let key = (method.to_string(), path);
    let delay = stub.delays.lock().unwrap().get(&key).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let canned = stub.responses.lock().unwrap().get(&key).cloned();

    match canned {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({ "detail": "Not Found" })))
            .into_response(),
    }
}
