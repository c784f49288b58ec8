//! HTTP transport: JSON-RPC over `POST /mcp`, one dispatcher per
//! `Mcp-Session-Id`, optional bearer auth and `/health`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json as AxumJson, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::protocol::ProtocolHandler;
use crate::server::McpServer;
use crate::types::{JsonRpcMessage, McpError, McpResult, RequestId};

pub const SESSION_HEADER: &str = "mcp-session-id";

/// Shared state passed to every route via axum `State`.
pub struct ServerState {
    pub token: Option<String>,
    pub server: Arc<McpServer>,
    sessions: Mutex<HashMap<String, Arc<ProtocolHandler>>>,
}

/// HTTP transport for web-based MCP clients.
pub struct SseTransport {
    state: Arc<ServerState>,
}

impl SseTransport {
    pub fn new(server: Arc<McpServer>, token: Option<String>) -> Self {
        Self {
            state: Arc::new(ServerState {
                token,
                server,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn router(&self) -> Router {
        let state = self.state.clone();
        Router::new()
            .route("/mcp", post(handle_request).delete(handle_delete))
            .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
            .route("/health", get(handle_health))
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
            .with_state(state)
    }

    /// Serve on `addr` until the listener fails.
    pub async fn run(&self, addr: &str) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP transport listening on {addr}");
        axum::serve(listener, self.router())
            .await
            .map_err(|e| McpError::Transport(e.to_string()))
    }
}

fn error_response(status: StatusCode, error: McpError) -> Response {
    let body =
        serde_json::to_value(error.to_json_rpc_error(RequestId::Null)).unwrap_or(Value::Null);
    (status, AxumJson(body)).into_response()
}

/// Checks the bearer token when one is configured. `/health` is routed
/// outside this layer.
async fn auth_layer(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: middleware::Next,
) -> Response {
    if let Some(expected) = &state.token {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected);

        if !authorized {
            tracing::warn!("Rejected request with missing or invalid bearer token");
            return error_response(StatusCode::UNAUTHORIZED, McpError::Unauthorized);
        }
    }
    next.run(request).await
}

fn session_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Requests without a session header get a fresh dispatcher. It is kept
/// only once it has a session, i.e. after a successful initialize.
async fn handle_request(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    AxumJson(body): AxumJson<Value>,
) -> Response {
    let existing = session_header(&headers);
    let handler = match &existing {
        Some(id) => match state.sessions.lock().await.get(id) {
            Some(handler) => handler.clone(),
            None => {
                return error_response(
                    StatusCode::NOT_FOUND,
                    McpError::SessionNotFound(id.clone()),
                )
            }
        },
        None => Arc::new(ProtocolHandler::new(state.server.clone())),
    };

    let msg: JsonRpcMessage = match serde_json::from_value(body) {
        Ok(msg) => msg,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                McpError::ParseError(e.to_string()),
            )
        }
    };

    let reply = handler.handle_message(msg).await;

    let session_id = handler.session_id();
    if existing.is_none() {
        if let Some(id) = &session_id {
            tracing::info!(session = %id, "HTTP session opened");
            state.sessions.lock().await.insert(id.clone(), handler.clone());
        }
    } else if handler.is_closed() {
        if let Some(id) = &existing {
            state.sessions.lock().await.remove(id);
        }
    }

    let mut response = match reply {
        Some(value) => AxumJson(value).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };
    if let Some(value) = session_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

async fn handle_delete(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let Some(id) = session_header(&headers) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            McpError::InvalidRequest(format!("missing {SESSION_HEADER} header")),
        );
    };
    match state.sessions.lock().await.remove(&id) {
        Some(handler) => {
            handler.close();
            tracing::info!(session = %id, "HTTP session deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, McpError::SessionNotFound(id)),
    }
}

async fn handle_health(State(state): State<Arc<ServerState>>) -> AxumJson<Value> {
    let sessions = state.sessions.lock().await.len();
    AxumJson(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": sessions,
        "rateLimit": state.server.limiter().snapshot(),
    }))
}
