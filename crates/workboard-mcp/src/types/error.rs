//! Error types and JSON-RPC error codes for the MCP server.

use std::time::Duration;

use serde_json::json;

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};
use crate::protocol::session::SessionState;
use crate::registry::{CapabilityKind, ParamViolation};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// MCP-specific error codes.
pub mod mcp_error_codes {
    pub const REQUEST_CANCELLED: i32 = -32800;
    pub const UNKNOWN_CAPABILITY: i32 = -32802;
    pub const INVALID_STATE: i32 = -32810;
    pub const ALREADY_INITIALIZED: i32 = -32811;
    pub const DUPLICATE_CAPABILITY: i32 = -32812;
    pub const HANDLER_ERROR: i32 = -32850;

    /// Server: Unauthorized (missing or invalid bearer token).
    pub const UNAUTHORIZED: i32 = -32900;
    /// Server: Unknown `Mcp-Session-Id` on the HTTP transport.
    pub const SESSION_NOT_FOUND: i32 = -32901;
    /// Server: Window call budget exhausted.
    pub const RATE_LIMITED: i32 = -32902;
    /// Server: In-flight ceiling reached.
    pub const CONCURRENCY_LIMITED: i32 = -32903;
}

/// All errors that can occur in the MCP server.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Params envelope could not be decoded (missing name, wrong shape).
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Arguments failed schema validation; carries every violation found.
    #[error("Invalid parameters: {}", join_violations(.0))]
    InvalidParameters(Vec<ParamViolation>),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Request cancelled")]
    RequestCancelled,

    #[error("Method not valid in state '{current}' (allowed: {})", join_states(.allowed))]
    InvalidState {
        current: SessionState,
        allowed: Vec<SessionState>,
    },

    #[error("Session already initialized")]
    AlreadyInitialized,

    #[error("Unknown {kind}: {id}")]
    UnknownCapability { kind: CapabilityKind, id: String },

    #[error("Duplicate {kind}: {id}")]
    DuplicateCapability { kind: CapabilityKind, id: String },

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Rate limit exceeded, retry after {:.1}s", secs(.retry_after))]
    RateLimitExceeded { retry_after: Duration },

    #[error("Too many concurrent requests, retry after {:.1}s", secs(.retry_after))]
    ConcurrencyLimitExceeded { retry_after: Duration },

    #[error("Handler error: {0}")]
    HandlerError(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or invalid bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

fn join_violations(violations: &[ParamViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn secs(d: &Duration) -> f64 {
    d.as_secs_f64()
}

fn join_states(states: &[SessionState]) -> String {
    states
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) | McpError::InvalidParameters(_) => INVALID_PARAMS,
            McpError::InternalError(_) => INTERNAL_ERROR,
            McpError::RequestCancelled => REQUEST_CANCELLED,
            McpError::InvalidState { .. } => INVALID_STATE,
            McpError::AlreadyInitialized => ALREADY_INITIALIZED,
            McpError::UnknownCapability { .. } => UNKNOWN_CAPABILITY,
            McpError::DuplicateCapability { .. } | McpError::InvalidDescriptor(_) => {
                DUPLICATE_CAPABILITY
            }
            McpError::RateLimitExceeded { .. } => RATE_LIMITED,
            McpError::ConcurrencyLimitExceeded { .. } => CONCURRENCY_LIMITED,
            McpError::HandlerError(_) => HANDLER_ERROR,
            McpError::Transport(_) | McpError::Config(_) | McpError::Io(_) => INTERNAL_ERROR,
            McpError::Json(_) => PARSE_ERROR,
            McpError::Unauthorized => UNAUTHORIZED,
            McpError::SessionNotFound(_) => SESSION_NOT_FOUND,
        }
    }

    /// Taxonomy name reported as `error.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            McpError::ParseError(_) | McpError::Json(_) => "ParseError",
            McpError::InvalidRequest(_) => "InvalidRequest",
            McpError::MethodNotFound(_) => "MethodNotFound",
            McpError::InvalidParams(_) | McpError::InvalidParameters(_) => "InvalidParameters",
            McpError::InternalError(_)
            | McpError::Transport(_)
            | McpError::Config(_)
            | McpError::Io(_) => "InternalError",
            McpError::RequestCancelled => "RequestCancelled",
            McpError::InvalidState { .. } => "InvalidState",
            McpError::AlreadyInitialized => "AlreadyInitialized",
            McpError::UnknownCapability { .. } => "UnknownCapability",
            McpError::DuplicateCapability { .. } => "DuplicateCapability",
            McpError::InvalidDescriptor(_) => "InvalidDescriptor",
            McpError::RateLimitExceeded { .. } => "RateLimitExceeded",
            McpError::ConcurrencyLimitExceeded { .. } => "ConcurrencyLimitExceeded",
            McpError::HandlerError(_) => "HandlerError",
            McpError::Unauthorized => "Unauthorized",
            McpError::SessionNotFound(_) => "SessionNotFound",
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            McpError::RateLimitExceeded { retry_after }
            | McpError::ConcurrencyLimitExceeded { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    fn data(&self) -> Option<serde_json::Value> {
        match self {
            McpError::InvalidParameters(violations) => Some(json!({ "violations": violations })),
            McpError::InvalidState { current, allowed } => Some(json!({
                "currentState": current,
                "allowedStates": allowed,
            })),
            McpError::UnknownCapability { kind, id } => {
                Some(json!({ "capability": kind, "id": id }))
            }
            _ => None,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code: self.code(),
                kind: self.kind().to_string(),
                message: self.to_string(),
                retry_after: self.retry_after().map(|d| d.as_secs_f64()),
                data: self.data(),
            },
        }
    }
}

impl From<workboard::BoardError> for McpError {
    fn from(e: workboard::BoardError) -> Self {
        McpError::HandlerError(e.to_string())
    }
}

pub type McpResult<T> = Result<T, McpError>;
