//! MCP capability and initialization types.

use serde::{Deserialize, Serialize};

use crate::registry::CapabilityKind;

pub const MCP_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "workboard-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Capability kinds this server implementation knows how to serve.
pub const SUPPORTED_KINDS: [CapabilityKind; 3] = [
    CapabilityKind::Resource,
    CapabilityKind::Tool,
    CapabilityKind::Prompt,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

impl Default for Implementation {
    fn default() -> Self {
        Self {
            name: "unknown".to_string(),
            version: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptsCapability {
    #[serde(default)]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesCapability {
    #[serde(default)]
    pub subscribe: bool,
    #[serde(default)]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    #[serde(default)]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(default)]
    pub protocol_version: String,
    /// Client capabilities are accepted but not interpreted.
    #[serde(default)]
    pub capabilities: serde_json::Value,
    #[serde(default)]
    pub client_info: Implementation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: Implementation,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl ServerCapabilities {
    /// Capability object advertising exactly the given kinds.
    pub fn for_kinds(kinds: &[CapabilityKind]) -> Self {
        let has = |k: CapabilityKind| kinds.contains(&k);
        Self {
            prompts: has(CapabilityKind::Prompt).then(PromptsCapability::default),
            resources: has(CapabilityKind::Resource).then(ResourcesCapability::default),
            tools: has(CapabilityKind::Tool).then(ToolsCapability::default),
        }
    }
}

impl Implementation {
    pub fn server() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
        }
    }
}

impl InitializeResult {
    pub fn new(session_id: String, negotiated: &[CapabilityKind]) -> Self {
        Self {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities::for_kinds(negotiated),
            server_info: Implementation::server(),
            session_id,
            instructions: Some(
                "Workboard MCP server exposes project boards and notes. \
                 Use resources to browse boards, items, users and notes. \
                 Use tools to create and update items and notes. \
                 Use prompts for guided project workflows."
                    .to_string(),
            ),
        }
    }
}
