//! Recognized request methods.

use std::str::FromStr;

use crate::types::McpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    ListResources,
    ReadResource,
    ListTools,
    CallTool,
    ListPrompts,
    ReadPrompt,
    Ping,
    Shutdown,
}

impl Method {
    /// MCP wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Initialize => "initialize",
            Method::ListResources => "resources/list",
            Method::ReadResource => "resources/read",
            Method::ListTools => "tools/list",
            Method::CallTool => "tools/call",
            Method::ListPrompts => "prompts/list",
            Method::ReadPrompt => "prompts/get",
            Method::Ping => "ping",
            Method::Shutdown => "shutdown",
        }
    }
}

impl FromStr for Method {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s {
            "initialize" | "Initialize" => Method::Initialize,
            "resources/list" | "ListResources" => Method::ListResources,
            "resources/read" | "ReadResource" => Method::ReadResource,
            "tools/list" | "ListTools" => Method::ListTools,
            "tools/call" | "CallTool" => Method::CallTool,
            "prompts/list" | "ListPrompts" => Method::ListPrompts,
            "prompts/get" | "ReadPrompt" => Method::ReadPrompt,
            "ping" => Method::Ping,
            "shutdown" => Method::Shutdown,
            other => return Err(McpError::MethodNotFound(other.to_string())),
        };
        Ok(method)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_naming_styles_parse() {
        assert_eq!("tools/call".parse::<Method>().unwrap(), Method::CallTool);
        assert_eq!("CallTool".parse::<Method>().unwrap(), Method::CallTool);
        assert_eq!("ReadPrompt".parse::<Method>().unwrap(), Method::ReadPrompt);
        assert_eq!("prompts/get".parse::<Method>().unwrap(), Method::ReadPrompt);
    }

    #[test]
    fn test_unknown_method() {
        let err = "resources/subscribe".parse::<Method>().unwrap_err();
        assert!(matches!(err, McpError::MethodNotFound(m) if m == "resources/subscribe"));
    }
}
