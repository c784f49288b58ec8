//! MCP resource implementations over the board workspace.

pub mod boards;
pub mod notes;
pub mod users;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Map, Value};

use workboard::Workspace;

use crate::registry::ResourceHandler;
use crate::server::ServerBuilder;
use crate::workspace::SharedWorkspace;

type ReadFn = fn(&Workspace, &Map<String, Value>) -> anyhow::Result<Value>;

/// A read-only query against the shared workspace.
pub struct WorkspaceResource {
    workspace: SharedWorkspace,
    read: ReadFn,
}

impl WorkspaceResource {
    pub fn new(workspace: &SharedWorkspace, read: ReadFn) -> Self {
        Self {
            workspace: workspace.clone(),
            read,
        }
    }
}

#[async_trait]
impl ResourceHandler for WorkspaceResource {
    async fn read(&self, _id: &str, params: &Map<String, Value>) -> anyhow::Result<Value> {
        let manager = self.workspace.lock().await;
        (self.read)(manager.workspace(), params)
    }
}

/// Register every workboard resource, in listing order.
pub fn register_all(builder: ServerBuilder, workspace: &SharedWorkspace) -> ServerBuilder {
    let builder = boards::register(builder, workspace);
    let builder = users::register(builder, workspace);
    notes::register(builder, workspace)
}

/// Required unsigned integer parameter. Only JSON integers are accepted,
/// so one id has one cache key.
pub(crate) fn require_u64(params: &Map<String, Value>, name: &str) -> anyhow::Result<u64> {
    params
        .get(name)
        .with_context(|| format!("missing required parameter '{name}'"))?
        .as_u64()
        .with_context(|| format!("parameter '{name}' must be a non-negative integer"))
}

pub(crate) fn require_str<'a>(
    params: &'a Map<String, Value>,
    name: &str,
) -> anyhow::Result<&'a str> {
    params
        .get(name)
        .and_then(Value::as_str)
        .with_context(|| format!("missing required parameter '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_u64_takes_integers_only() {
        let params = json!({"a": 7, "b": "12", "c": "x", "d": -1, "e": 1.0});
        let params = params.as_object().unwrap();
        assert_eq!(require_u64(params, "a").unwrap(), 7);
        let err = require_u64(params, "b").unwrap_err();
        assert_eq!(err.to_string(), "parameter 'b' must be a non-negative integer");
        assert!(require_u64(params, "e").is_err());
        assert!(require_u64(params, "c").is_err());
        assert!(require_u64(params, "d").is_err());
        let err = require_u64(params, "missing").unwrap_err();
        assert_eq!(err.to_string(), "missing required parameter 'missing'");
    }
}
