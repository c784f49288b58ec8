//! Main request dispatcher: receives JSON-RPC messages for one connection,
//! gates them on the session state and routes them to the registered
//! handlers.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::cache::CacheKey;
use crate::registry::{CacheInvalidation, CapabilityDescriptor, CapabilityKind};
use crate::server::McpServer;
use crate::types::*;

use super::method::Method;
use super::negotiation;
use super::session::{ConnectionSession, SessionState};
use super::validator::validate_request;

#[derive(Debug)]
struct Connection {
    state: SessionState,
    session: Option<ConnectionSession>,
}

/// Dispatcher for one client connection over a shared server.
pub struct ProtocolHandler {
    server: Arc<McpServer>,
    connection: Mutex<Connection>,
    closed: watch::Sender<bool>,
}

impl ProtocolHandler {
    pub fn new(server: Arc<McpServer>) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            server,
            connection: Mutex::new(Connection {
                state: SessionState::Uninitialized,
                session: None,
            }),
            closed,
        }
    }

    pub fn server(&self) -> &Arc<McpServer> {
        &self.server
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.connection.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn session(&self) -> Option<ConnectionSession> {
        self.lock().session.clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.lock().session.as_ref().map(|s| s.id.to_string())
    }

    pub fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }

    /// Move to `closed` and cancel in-flight resource reads and tool calls.
    /// Calling it again has no effect.
    pub fn close(&self) {
        {
            let mut conn = self.lock();
            if conn.state == SessionState::Closed {
                return;
            }
            conn.state = SessionState::Closed;
        }
        self.closed.send_replace(true);
        tracing::info!(session = ?self.session_id(), "Connection closed");
    }

    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            _ => {
                tracing::warn!("Received unexpected message type from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        if let Err(e) = validate_request(&request) {
            return to_value(e.to_json_rpc_error(request.id));
        }

        let id = request.id.clone();
        let result = match request.method.parse::<Method>() {
            Ok(method) => {
                tracing::debug!(
                    session = ?self.session_id(),
                    method = %method,
                    id = %id,
                    "Dispatching request"
                );
                self.dispatch_request(method, request.params).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(value) => to_value(JsonRpcResponse::new(id, value)),
            Err(e) => {
                tracing::debug!(id = %id, kind = e.kind(), "Request failed: {e}");
                to_value(e.to_json_rpc_error(id))
            }
        }
    }

    async fn dispatch_request(&self, method: Method, params: Option<Value>) -> McpResult<Value> {
        if method != Method::Initialize {
            self.state().require(&[SessionState::Ready])?;
        }

        match method {
            Method::Initialize => self.handle_initialize(params),
            Method::Shutdown => self.handle_shutdown(),
            Method::Ping => Ok(Value::Object(Map::new())),

            Method::ListTools => json_result(ToolListResult {
                tools: self.server.registry().tool_definitions(),
                next_cursor: None,
            }),
            Method::CallTool => self.handle_tools_call(params).await,

            Method::ListResources => json_result(ResourceListResult {
                resources: self.server.registry().resource_definitions(),
                next_cursor: None,
            }),
            Method::ReadResource => self.handle_resources_read(params).await,

            Method::ListPrompts => json_result(PromptListResult {
                prompts: self.server.registry().prompt_definitions(),
                next_cursor: None,
            }),
            Method::ReadPrompt => self.handle_prompts_get(params),
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "initialized" | "notifications/initialized" => {
                tracing::info!(session = ?self.session_id(), "MCP handshake complete");
            }
            "notifications/cancelled" | "$/cancelRequest" => {
                let params = notification
                    .params
                    .and_then(|p| serde_json::from_value::<CancelRequestParams>(p).ok());
                match params {
                    Some(p) => tracing::info!(
                        request = %p.request_id,
                        reason = p.reason.as_deref().unwrap_or(""),
                        "Client cancelled request"
                    ),
                    None => tracing::info!("Received cancellation notification"),
                }
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = match params {
            Some(Value::Null) | None => InitializeParams::default(),
            Some(v) => {
                serde_json::from_value(v).map_err(|e| McpError::InvalidParams(e.to_string()))?
            }
        };

        let session = {
            let mut conn = self.lock();
            match conn.state {
                SessionState::Uninitialized => {}
                SessionState::Closed => {
                    return Err(McpError::InvalidState {
                        current: SessionState::Closed,
                        allowed: vec![SessionState::Uninitialized],
                    })
                }
                _ => return Err(McpError::AlreadyInitialized),
            }
            conn.state = SessionState::Negotiating;

            negotiation::check_version(&init_params);
            let mut session = ConnectionSession::new(init_params.client_info);
            session.negotiated = negotiation::negotiate(self.server.registry());

            conn.state = SessionState::Ready;
            conn.session = Some(session.clone());
            session
        };

        tracing::info!(
            session = %session.id,
            negotiated = ?session.negotiated,
            "Initialized with client: {} v{}",
            session.client.name,
            session.client.version
        );

        json_result(InitializeResult::new(
            session.id.to_string(),
            &session.negotiated,
        ))
    }

    fn handle_shutdown(&self) -> McpResult<Value> {
        tracing::info!(session = ?self.session_id(), "Shutdown requested");
        self.close();
        Ok(Value::Object(Map::new()))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> McpResult<Value> {
        let call_params: ToolCallParams = parse_params(params, "Tool call params required")?;
        let registry = self.server.registry();
        let descriptor = registry.resolve(CapabilityKind::Tool, &call_params.name)?;
        let tool = descriptor.as_tool().ok_or_else(|| missing_spec(descriptor))?;
        let args = call_params.arguments.unwrap_or_default();

        tool.params
            .validate(&args)
            .map_err(McpError::InvalidParameters)?;

        let handler = self
            .server
            .handlers()
            .tool(&descriptor.id)
            .ok_or_else(|| no_handler(descriptor))?;

        let permit = self.server.limiter().try_acquire()?;
        let outcome = self.cancellable(handler.call(&descriptor.id, &args)).await;
        drop(permit);

        let value = outcome?.map_err(|e| {
            tracing::warn!(tool = %descriptor.id, "Tool failed: {e:#}");
            McpError::HandlerError(format!("{e:#}"))
        })?;

        if tool.side_effects {
            self.invalidate(&tool.invalidates, &args);
        }
        tracing::debug!(tool = %descriptor.id, "Tool call complete");
        json_result(ToolCallResult::json(value))
    }

    async fn handle_resources_read(&self, params: Option<Value>) -> McpResult<Value> {
        let read_params: ResourceReadParams =
            parse_params(params, "Resource read params required")?;
        let descriptor = self
            .server
            .registry()
            .resolve(CapabilityKind::Resource, &read_params.uri)?;
        let args = read_params.arguments.unwrap_or_default();

        let ttl = self.server.cache_ttl(descriptor);
        let key = CacheKey::derive(&descriptor.id, &args);
        if ttl.is_some() {
            if let Some(cached) = self.server.cache().get(&key) {
                return json_result(read_result(descriptor, &cached, true));
            }
        }

        let handler = self
            .server
            .handlers()
            .resource(&descriptor.id)
            .ok_or_else(|| no_handler(descriptor))?;

        let seen = self.server.cache().generation(&descriptor.id);
        let permit = self.server.limiter().try_acquire()?;
        let outcome = self.cancellable(handler.read(&descriptor.id, &args)).await;
        drop(permit);

        let value = outcome?.map_err(|e| {
            tracing::warn!(resource = %descriptor.id, "Resource read failed: {e:#}");
            McpError::HandlerError(format!("{e:#}"))
        })?;

        let result = read_result(descriptor, &value, false);
        if let Some(ttl) = ttl {
            self.server.cache().put_if_current(key, value, ttl, seen);
        }
        json_result(result)
    }

    fn handle_prompts_get(&self, params: Option<Value>) -> McpResult<Value> {
        let get_params: PromptGetParams = parse_params(params, "Prompt get params required")?;
        let descriptor = self
            .server
            .registry()
            .resolve(CapabilityKind::Prompt, &get_params.name)?;
        let prompt = descriptor.as_prompt().ok_or_else(|| missing_spec(descriptor))?;

        json_result(PromptGetResult {
            name: descriptor.id.clone(),
            description: descriptor.description.clone(),
            steps: prompt.steps.clone(),
        })
    }

    /// Run `fut` unless the connection closes first.
    async fn cancellable<T>(&self, fut: impl Future<Output = T>) -> McpResult<T> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Err(McpError::RequestCancelled);
        }
        let cancelled = async move {
            loop {
                if closed.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
                if *closed.borrow_and_update() {
                    break;
                }
            }
        };
        tokio::select! {
            out = fut => Ok(out),
            _ = cancelled => {
                tracing::info!("In-flight request cancelled by connection close");
                Err(McpError::RequestCancelled)
            }
        }
    }

    fn invalidate(&self, targets: &[CacheInvalidation], args: &Map<String, Value>) {
        let cache = self.server.cache();
        for target in targets {
            match target {
                CacheInvalidation::Resource(resource) => {
                    let removed = cache.invalidate_resource(resource);
                    tracing::debug!(resource = %resource, removed, "Invalidated resource");
                }
                CacheInvalidation::Scoped { resource, bind } => {
                    let params: Map<String, Value> = bind
                        .iter()
                        .filter_map(|name| args.get(name).map(|v| (name.clone(), v.clone())))
                        .collect();
                    let removed = cache.invalidate_matching(resource, &params);
                    tracing::debug!(resource = %resource, removed, "Invalidated scoped entry");
                }
                CacheInvalidation::All => {
                    let removed = cache.invalidate_all();
                    tracing::debug!(removed, "Invalidated entire cache");
                }
            }
        }
    }
}

fn to_value(v: impl serde::Serialize) -> Value {
    serde_json::to_value(v).unwrap_or_default()
}

fn json_result(v: impl serde::Serialize) -> McpResult<Value> {
    serde_json::to_value(v).map_err(|e| McpError::InternalError(e.to_string()))
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>, missing: &str) -> McpResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams(missing.to_string()))
}

fn read_result(
    descriptor: &CapabilityDescriptor,
    value: &Value,
    cached: bool,
) -> ReadResourceResult {
    let mime_type = descriptor
        .as_resource()
        .and_then(|r| r.mime_type.clone())
        .unwrap_or_else(|| "application/json".to_string());
    ReadResourceResult {
        contents: vec![ResourceContent {
            uri: descriptor.id.clone(),
            mime_type: Some(mime_type),
            text: Some(serde_json::to_string_pretty(value).unwrap_or_default()),
        }],
        cached,
    }
}

fn no_handler(descriptor: &CapabilityDescriptor) -> McpError {
    McpError::InternalError(format!(
        "No handler registered for {} '{}'",
        descriptor.kind(),
        descriptor.id
    ))
}

fn missing_spec(descriptor: &CapabilityDescriptor) -> McpError {
    McpError::InternalError(format!("Descriptor '{}' has the wrong kind", descriptor.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::registry::{FnResource, ParamSchema, PromptStep};
    use serde_json::json;

    fn server() -> Arc<McpServer> {
        Arc::new(
            McpServer::builder(ServerConfig::default())
                .resource(
                    CapabilityDescriptor::resource("boards", "Boards"),
                    FnResource::new(|_: &Map<String, Value>| Ok(json!([{"id": 1}]))),
                )
                .prompt(CapabilityDescriptor::prompt(
                    "intro",
                    "Intro",
                    vec![PromptStep::display("welcome", "Welcome", "Hello")],
                ))
                .build()
                .unwrap(),
        )
    }

    async fn call(handler: &ProtocolHandler, id: i64, method: &str, params: Value) -> Value {
        let req = JsonRpcRequest::new(RequestId::Number(id), method, Some(params));
        handler
            .handle_message(JsonRpcMessage::Request(req))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_methods_rejected_before_initialize() {
        let handler = ProtocolHandler::new(server());
        let resp = call(&handler, 1, "tools/list", json!({})).await;
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["error"]["kind"], "InvalidState");
        assert_eq!(resp["error"]["data"]["currentState"], "uninitialized");
        assert_eq!(resp["error"]["data"]["allowedStates"], json!(["ready"]));
    }

    #[tokio::test]
    async fn test_initialize_negotiates_non_empty_kinds() {
        let handler = ProtocolHandler::new(server());
        let resp = call(&handler, 1, "initialize", json!({"protocolVersion": "2024-11-05"})).await;
        let caps = &resp["result"]["capabilities"];
        assert!(caps.get("resources").is_some());
        assert!(caps.get("prompts").is_some());
        assert!(caps.get("tools").is_none());
        assert_eq!(handler.state(), SessionState::Ready);
        assert_eq!(
            resp["result"]["sessionId"].as_str(),
            handler.session_id().as_deref()
        );
    }

    #[tokio::test]
    async fn test_second_initialize_fails() {
        let handler = ProtocolHandler::new(server());
        call(&handler, 1, "Initialize", json!({})).await;
        let resp = call(&handler, 2, "Initialize", json!({})).await;
        assert_eq!(resp["error"]["kind"], "AlreadyInitialized");
    }

    #[tokio::test]
    async fn test_shutdown_closes_session() {
        let handler = ProtocolHandler::new(server());
        call(&handler, 1, "initialize", json!({})).await;
        let resp = call(&handler, 2, "shutdown", json!({})).await;
        assert_eq!(resp["result"], json!({}));
        assert!(handler.is_closed());

        let resp = call(&handler, 3, "ping", json!({})).await;
        assert_eq!(resp["error"]["data"]["currentState"], "closed");
        let resp = call(&handler, 4, "initialize", json!({})).await;
        assert_eq!(resp["error"]["kind"], "InvalidState");
    }

    #[tokio::test]
    async fn test_unknown_method_and_capability() {
        let handler = ProtocolHandler::new(server());
        call(&handler, 1, "initialize", json!({})).await;

        let resp = call(&handler, 2, "resources/subscribe", json!({})).await;
        assert_eq!(resp["error"]["kind"], "MethodNotFound");

        let resp = call(&handler, 3, "tools/call", json!({"name": "nope"})).await;
        assert_eq!(resp["error"]["kind"], "UnknownCapability");
        assert_eq!(resp["error"]["data"]["capability"], "tool");

        let resp = call(&handler, 4, "ReadPrompt", json!({"promptId": "intro"})).await;
        assert_eq!(resp["result"]["steps"][0]["computedContent"], "Hello");
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let handler = ProtocolHandler::new(server());
        let notif = JsonRpcNotification::new("notifications/initialized".to_string(), None);
        assert!(handler
            .handle_message(JsonRpcMessage::Notification(notif))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_read_without_cache_ttl_calls_handler_each_time() {
        let handler = ProtocolHandler::new(server());
        call(&handler, 1, "initialize", json!({})).await;
        let first = call(&handler, 2, "resources/read", json!({"uri": "boards"})).await;
        let second = call(&handler, 3, "resources/read", json!({"uri": "boards"})).await;
        assert_eq!(first["result"]["cached"], false);
        assert_eq!(second["result"]["cached"], false);
        assert_eq!(first["result"]["contents"][0]["mimeType"], "application/json");
        assert_eq!(handler.server().limiter().snapshot().remaining, 998);
    }

    #[tokio::test]
    async fn test_tool_schema_checked_before_dispatch() {
        let server = Arc::new(
            McpServer::builder(ServerConfig::default())
                .tool(
                    CapabilityDescriptor::tool(
                        "echo",
                        "Echo",
                        ParamSchema::new().required(
                            "text",
                            crate::registry::ParamType::String,
                            "",
                        ),
                    ),
                    crate::registry::FnTool::new(|args: &Map<String, Value>| Ok(json!(args))),
                )
                .build()
                .unwrap(),
        );
        let handler = ProtocolHandler::new(server);
        call(&handler, 1, "initialize", json!({})).await;

        let resp = call(&handler, 2, "CallTool", json!({"name": "echo", "parameters": {}})).await;
        assert_eq!(resp["error"]["kind"], "InvalidParameters");
        assert_eq!(handler.server().limiter().snapshot().remaining, 1000);

        let resp = call(
            &handler,
            3,
            "tools/call",
            json!({"name": "echo", "arguments": {"text": "hi"}}),
        )
        .await;
        assert_eq!(resp["result"]["structuredContent"]["text"], "hi");
    }
}
