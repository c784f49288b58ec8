//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Map, Value};

use workboard::Workspace;
use workboard_mcp::protocol::ProtocolHandler;
use workboard_mcp::types::JsonRpcMessage;
use workboard_mcp::{build_server, McpServer, ServerConfig, SharedWorkspace, WorkspaceManager};

/// Build an MCP JSON-RPC request.
pub fn request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

pub fn init_request() -> Value {
    request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    )
}

pub async fn send(handler: &ProtocolHandler, msg: Value) -> Option<Value> {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    handler.handle_message(parsed).await
}

pub async fn send_unwrap(handler: &ProtocolHandler, msg: Value) -> Value {
    send(handler, msg).await.expect("expected response")
}

/// A dispatcher that has completed initialize.
pub async fn ready(server: Arc<McpServer>) -> ProtocolHandler {
    let handler = ProtocolHandler::new(server);
    let resp = send_unwrap(&handler, init_request()).await;
    assert!(resp.get("result").is_some(), "initialize failed: {resp}");
    handler
}

pub fn sample_workspace() -> SharedWorkspace {
    WorkspaceManager::in_memory(Workspace::sample()).into_shared()
}

pub fn workboard_server(config: ServerConfig) -> (Arc<McpServer>, SharedWorkspace) {
    let workspace = sample_workspace();
    let server = build_server(config, &workspace).unwrap();
    (Arc::new(server), workspace)
}

/// A handler body that counts its invocations.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn returning(
        &self,
        value: Value,
    ) -> impl Fn(&Map<String, Value>) -> anyhow::Result<Value> + Send + Sync + 'static {
        let count = self.0.clone();
        move |_: &Map<String, Value>| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(value.clone())
        }
    }
}

pub fn error_kind(resp: &Value) -> &str {
    resp["error"]["kind"].as_str().unwrap_or("<none>")
}

/// Decode the JSON payload a resource read returned as text.
pub fn read_payload(resp: &Value) -> Value {
    let text = resp["result"]["contents"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}
