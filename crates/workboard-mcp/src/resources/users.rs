//! Resources: user details and workload.

use std::time::Duration;

use serde_json::{Map, Value};

use workboard::Workspace;

use crate::registry::CapabilityDescriptor;
use crate::server::ServerBuilder;
use crate::workspace::SharedWorkspace;

use super::{require_u64, WorkspaceResource};

pub fn register(builder: ServerBuilder, workspace: &SharedWorkspace) -> ServerBuilder {
    builder
        .resource(
            CapabilityDescriptor::resource("user_details", "User details")
                .with_description("Name, email and title of a user (params: user_id)")
                .with_cache_ttl(Duration::from_secs(300)),
            WorkspaceResource::new(workspace, read_user),
        )
        .resource(
            CapabilityDescriptor::resource("user_workload", "User workload")
                .with_description("Items assigned to a user across boards (params: user_id)"),
            WorkspaceResource::new(workspace, read_workload),
        )
}

fn read_user(ws: &Workspace, params: &Map<String, Value>) -> anyhow::Result<Value> {
    let user_id = require_u64(params, "user_id")?;
    Ok(serde_json::to_value(ws.user(user_id)?)?)
}

fn read_workload(ws: &Workspace, params: &Map<String, Value>) -> anyhow::Result<Value> {
    let user_id = require_u64(params, "user_id")?;
    Ok(serde_json::to_value(ws.user_workload(user_id)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_workload_groups_by_status() {
        let params = json!({"user_id": 100});
        let v = read_workload(&Workspace::sample(), params.as_object().unwrap()).unwrap();
        assert_eq!(v["total"], 2);
        assert_eq!(v["by_status"]["Done"], 1);
        assert_eq!(v["user"]["name"], "Avery Quinn");
    }

    #[test]
    fn test_unknown_user() {
        let params = json!({"user_id": 7});
        let err = read_user(&Workspace::sample(), params.as_object().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "User not found: 7");
    }
}
