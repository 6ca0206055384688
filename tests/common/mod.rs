//! Shared utilities for integration tests: a programmable mock Tableau
//! instance (plus text-generation endpoint) and a relay bound to it.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tableau_relay::{HttpServer, RelayConfig, Shutdown};
use tokio::net::TcpListener;

pub const TOKEN: &str = "tok-123";
pub const SITE_ID: &str = "site-1";

/// Knobs and counters shared with the mock's handlers.
#[derive(Default)]
pub struct MockState {
    pub omit_token: AtomicBool,
    pub reject_sign_in: AtomicBool,
    pub fail_projects: AtomicBool,
    pub fail_workbooks: AtomicBool,
    pub failing_downloads: Mutex<HashSet<String>>,
    pub slow_downloads: Mutex<HashSet<String>>,
    pub redirects: Mutex<HashMap<String, String>>,
    pub sign_ins: AtomicUsize,
    pub downloads: AtomicUsize,
    pub last_sign_in_body: Mutex<Option<String>>,
}

pub struct MockTableau {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockTableau {
    /// Value for the `instance` field of relay requests.
    pub fn instance(&self) -> String {
        self.addr.to_string()
    }

    pub fn content_url(&self, workbook_id: &str) -> String {
        format!(
            "http://{}/api/3.24/sites/{}/workbooks/{}/content",
            self.addr, SITE_ID, workbook_id
        )
    }

    pub fn fail_download(&self, workbook_id: &str) {
        self.state
            .failing_downloads
            .lock()
            .unwrap()
            .insert(workbook_id.to_string());
    }

    /// Answer content requests for `workbook_id` with a redirect to `location`.
    pub fn redirect_download(&self, workbook_id: &str, location: String) {
        self.state
            .redirects
            .lock()
            .unwrap()
            .insert(workbook_id.to_string(), location);
    }

    pub fn slow_download(&self, workbook_id: &str) {
        self.state
            .slow_downloads
            .lock()
            .unwrap()
            .insert(workbook_id.to_string());
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-tableau-auth")
        .and_then(|v| v.to_str().ok())
        == Some(TOKEN)
}

async fn sign_in(State(state): State<Arc<MockState>>, body: String) -> Response {
    state.sign_ins.fetch_add(1, Ordering::SeqCst);
    *state.last_sign_in_body.lock().unwrap() = Some(body);

    if state.reject_sign_in.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"code": "401001"}}))).into_response();
    }
    if state.omit_token.load(Ordering::SeqCst) {
        return Json(json!({"credentials": {"site": {"id": SITE_ID, "contentUrl": ""}}})).into_response();
    }
    Json(json!({
        "credentials": {
            "token": TOKEN,
            "site": {"id": SITE_ID, "contentUrl": ""},
            "user": {"id": "user-1"}
        }
    }))
    .into_response()
}

async fn projects(
    State(state): State<Arc<MockState>>,
    Path(site): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) || site != SITE_ID {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.fail_projects.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({
        "pagination": {"pageNumber": "1", "pageSize": "1000", "totalAvailable": "3"},
        "projects": {"project": [
            {"id": "p1", "name": "Finance", "description": "Money matters"},
            {"id": "p2", "name": "Marketing", "description": ""},
            {"id": "p3", "name": "Empty"}
        ]}
    }))
    .into_response()
}

async fn workbooks(
    State(state): State<Arc<MockState>>,
    Path(site): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) || site != SITE_ID {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.fail_workbooks.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({
        "workbooks": {"workbook": [
            {"id": "wb1", "name": "Sales", "project": {"id": "p1", "name": "Finance"},
             "webpageUrl": "https://tableau/#/workbooks/1",
             "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-03-01T00:00:00Z"},
            {"id": "wb2", "name": "Report.twb", "project": {"id": "p1", "name": "Finance"}},
            {"id": "wb3", "name": "Campaign", "project": {"id": "p2", "name": "Marketing"}},
            {"id": "wb4", "name": "Stray", "project": {"id": "p9", "name": "Deleted"}}
        ]}
    }))
    .into_response()
}

async fn content(
    State(state): State<Arc<MockState>>,
    Path((_site, workbook_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let redirect = state.redirects.lock().unwrap().get(&workbook_id).cloned();
    if let Some(location) = redirect {
        return Redirect::temporary(&location).into_response();
    }
    state.downloads.fetch_add(1, Ordering::SeqCst);

    let slow = state.slow_downloads.lock().unwrap().contains(&workbook_id);
    if slow {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    let failing = state.failing_downloads.lock().unwrap().contains(&workbook_id);
    if failing {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Bytes::from(format!("content-of-{workbook_id}")).into_response()
}

async fn generate(Json(payload): Json<Value>) -> Response {
    if payload.get("fail").and_then(Value::as_bool) == Some(true) {
        return (StatusCode::TOO_MANY_REQUESTS, Json(json!({"message": "quota exceeded"})))
            .into_response();
    }
    if payload.get("plain_error").and_then(Value::as_bool) == Some(true) {
        return (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response();
    }
    Json(json!({"output": "bar chart", "echo": payload})).into_response()
}

/// Start the mock upstream on an ephemeral port.
pub async fn start_mock_tableau() -> MockTableau {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/api/3.24/auth/signin", post(sign_in))
        .route("/api/3.24/sites/{site}/projects", get(projects))
        .route("/api/3.24/sites/{site}/workbooks", get(workbooks))
        .route("/api/3.24/sites/{site}/workbooks/{id}/content", get(content))
        .route("/generate", post(generate))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockTableau { addr, state }
}

/// Relay configuration pointing at `mock` over plain HTTP.
pub fn relay_config(mock: &MockTableau) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.tableau.scheme = "http".into();
    config.upstream.system_proxy = false;
    config.generation.endpoint = format!("http://{}/generate", mock.addr);
    config.downloads.item_timeout_secs = 1;
    config
}

pub struct RunningRelay {
    pub base_url: String,
    pub shutdown: Shutdown,
}

impl RunningRelay {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for RunningRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a relay with `config` on an ephemeral port.
pub async fn start_relay(config: RelayConfig) -> RunningRelay {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningRelay {
        base_url: format!("http://{}", addr),
        shutdown,
    }
}

/// Client that never routes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
