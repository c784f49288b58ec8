//! JSON-RPC message validation.

use crate::types::{JsonRpcRequest, McpError, McpResult, JSONRPC_VERSION};

/// Validate that a JSON-RPC request is well-formed.
pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{}\"",
            request.jsonrpc
        )));
    }

    if request.method.is_empty() {
        return Err(McpError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    if let Some(params) = &request.params {
        if !params.is_object() && !params.is_null() {
            return Err(McpError::InvalidRequest(
                "Params must be an object".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestId;
    use serde_json::json;

    #[test]
    fn test_rejects_wrong_version_and_positional_params() {
        let mut req = JsonRpcRequest::new(RequestId::Number(1), "ping", None);
        assert!(validate_request(&req).is_ok());

        req.params = Some(json!([1, 2]));
        assert!(matches!(
            validate_request(&req),
            Err(McpError::InvalidRequest(_))
        ));

        req.params = None;
        req.jsonrpc = "1.0".to_string();
        assert!(validate_request(&req).is_err());
    }
}
