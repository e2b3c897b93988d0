//! In-process mock of the daemon HTTP API.
//!
//! [`MockDaemon`] serves the endpoints clashctl uses on a loopback port,
//! records every request it receives, and lets tests script per-proxy
//! delay results. The server task is aborted when the value is dropped.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::body::Body;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::debug;

use clashctl_config::ServerConfig;
use clashctl_core::DaemonClient;
use clashctl_core::types::{ConnectionsSnapshot, ModeConfig, Proxy, SelectRequest, Traffic};

/// Scripted answer of the delay endpoint for one proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayScript {
    /// Respond with this delay in milliseconds.
    Ok(u64),
    /// Respond with an error status.
    Fail,
    /// Never respond.
    Stall,
}

/// One request as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    /// Raw (still percent-encoded) path.
    pub path: String,
    pub query: Option<String>,
    pub body: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct MockState {
    proxies: Mutex<BTreeMap<String, Proxy>>,
    delays: Mutex<HashMap<String, DelayScript>>,
    mode: Mutex<String>,
    connections: Mutex<ConnectionsSnapshot>,
    traffic_frames: Vec<String>,
    secret: Option<String>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Builder for [`MockDaemon`].
pub struct MockDaemonBuilder {
    state: MockState,
}

impl MockDaemonBuilder {
    pub fn new() -> Self {
        let state = MockState {
            mode: Mutex::new("rule".to_string()),
            ..Default::default()
        };
        Self { state }
    }

    /// Add a proxy or group to the catalog.
    pub fn proxy(self, proxy: Proxy) -> Self {
        self.state
            .proxies
            .lock()
            .unwrap()
            .insert(proxy.name.clone(), proxy);
        self
    }

    pub fn delay(self, name: &str, script: DelayScript) -> Self {
        self.state
            .delays
            .lock()
            .unwrap()
            .insert(name.to_string(), script);
        self
    }

    pub fn mode(self, mode: &str) -> Self {
        *self.state.mode.lock().unwrap() = mode.to_string();
        self
    }

    pub fn connections(self, snapshot: ConnectionsSnapshot) -> Self {
        *self.state.connections.lock().unwrap() = snapshot;
        self
    }

    /// Frame sent on the traffic socket.
    pub fn traffic(mut self, frame: Traffic) -> Self {
        let text = serde_json::to_string(&frame).expect("traffic frame serializes");
        self.state.traffic_frames.push(text);
        self
    }

    /// Raw text frame sent on the traffic socket, for malformed input.
    pub fn raw_traffic(mut self, text: &str) -> Self {
        self.state.traffic_frames.push(text.to_string());
        self
    }

    /// Require `Authorization: Bearer <secret>` on every request.
    pub fn secret(mut self, secret: &str) -> Self {
        self.state.secret = Some(secret.to_string());
        self
    }

    /// Bind a loopback port and start serving.
    pub async fn start(self) -> MockDaemon {
        let state = Arc::new(self.state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock daemon");
        let addr = listener.local_addr().expect("mock daemon has an address");
        let app = router(state.clone());
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        debug!(%addr, "mock daemon listening");
        MockDaemon { addr, state, task }
    }
}

impl Default for MockDaemonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running mock daemon.
pub struct MockDaemon {
    addr: SocketAddr,
    state: Arc<MockState>,
    task: JoinHandle<()>,
}

impl MockDaemon {
    pub fn builder() -> MockDaemonBuilder {
        MockDaemonBuilder::new()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Server entry pointing at this daemon, carrying its secret.
    pub fn server_config(&self) -> ServerConfig {
        let server = ServerConfig::new(self.addr.ip().to_string(), self.addr.port());
        match &self.state.secret {
            Some(secret) => server.with_secret(secret.as_str()),
            None => server,
        }
    }

    pub fn client(&self) -> DaemonClient {
        DaemonClient::new(&self.server_config()).expect("mock daemon client")
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests whose method matches and whose path starts with `prefix`.
    pub fn requests_to(&self, method: &str, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path.starts_with(prefix))
            .collect()
    }

    pub fn proxy(&self, name: &str) -> Option<Proxy> {
        self.state.proxies.lock().unwrap().get(name).cloned()
    }

    pub fn mode(&self) -> String {
        self.state.mode.lock().unwrap().clone()
    }

    pub fn set_delay(&self, name: &str, script: DelayScript) {
        self.state
            .delays
            .lock()
            .unwrap()
            .insert(name.to_string(), script);
    }
}

impl Drop for MockDaemon {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn router(state: Arc<MockState>) -> axum::Router {
    axum::Router::new()
        .route("/proxies", get(handle_proxies))
        .route("/proxies/{name}", get(handle_proxy).put(handle_select))
        .route("/proxies/{name}/delay", get(handle_delay))
        .route("/configs", get(handle_mode).patch(handle_set_mode))
        .route("/connections", get(handle_connections))
        .route("/version", get(handle_version))
        .route("/traffic", get(handle_traffic))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn record(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let authorization = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.requests.lock().unwrap().push(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        body: String::from_utf8_lossy(&bytes).into_owned(),
        authorization: authorization.clone(),
    });

    if let Some(secret) = &state.secret {
        if authorization.as_deref() != Some(format!("Bearer {secret}").as_str()) {
            return error(StatusCode::UNAUTHORIZED, "Unauthorized");
        }
    }
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

async fn handle_proxies(State(state): State<Arc<MockState>>) -> Response {
    let proxies = state.proxies.lock().unwrap().clone();
    Json(json!({ "proxies": proxies })).into_response()
}

async fn handle_proxy(State(state): State<Arc<MockState>>, Path(name): Path<String>) -> Response {
    match state.proxies.lock().unwrap().get(&name) {
        Some(proxy) => Json(proxy.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "resource not found"),
    }
}

async fn handle_select(
    State(state): State<Arc<MockState>>,
    Path(name): Path<String>,
    Json(req): Json<SelectRequest>,
) -> Response {
    let mut proxies = state.proxies.lock().unwrap();
    let Some(group) = proxies.get_mut(&name) else {
        return error(StatusCode::NOT_FOUND, "resource not found");
    };
    if !group.all.contains(&req.name) {
        return error(StatusCode::BAD_REQUEST, "Selector update error: Proxy does not exist");
    }
    group.now = req.name;
    StatusCode::NO_CONTENT.into_response()
}

async fn handle_delay(State(state): State<Arc<MockState>>, Path(name): Path<String>) -> Response {
    let script = state.delays.lock().unwrap().get(&name).copied();
    match script {
        Some(DelayScript::Ok(delay)) => Json(json!({ "delay": delay })).into_response(),
        Some(DelayScript::Stall) => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            error(StatusCode::REQUEST_TIMEOUT, "Timeout")
        }
        Some(DelayScript::Fail) => {
            error(StatusCode::SERVICE_UNAVAILABLE, "An error occurred in the delay test")
        }
        None => error(StatusCode::REQUEST_TIMEOUT, "Timeout"),
    }
}

async fn handle_mode(State(state): State<Arc<MockState>>) -> Json<ModeConfig> {
    Json(ModeConfig {
        mode: state.mode.lock().unwrap().clone(),
    })
}

async fn handle_set_mode(
    State(state): State<Arc<MockState>>,
    Json(req): Json<ModeConfig>,
) -> StatusCode {
    *state.mode.lock().unwrap() = req.mode;
    StatusCode::NO_CONTENT
}

async fn handle_connections(State(state): State<Arc<MockState>>) -> Json<ConnectionsSnapshot> {
    Json(state.connections.lock().unwrap().clone())
}

async fn handle_version() -> Json<serde_json::Value> {
    Json(json!({ "version": "mock", "premium": false }))
}

async fn handle_traffic(State(state): State<Arc<MockState>>, ws: WebSocketUpgrade) -> Response {
    let frames = state.traffic_frames.clone();
    ws.on_upgrade(move |socket| send_frames(socket, frames))
}

async fn send_frames(mut socket: WebSocket, frames: Vec<String>) {
    for frame in frames {
        if socket.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}
