//! Tool: assign_user_to_item.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use workboard::Workspace;

use crate::registry::{CacheInvalidation, CapabilityDescriptor, ParamSchema, ParamType};

use super::decode;

#[derive(Debug, Deserialize)]
struct AssignParams {
    item_id: u64,
    user_id: u64,
}

pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::tool(
        "assign_user_to_item",
        "Assign user to item",
        ParamSchema::new()
            .required("item_id", ParamType::Integer, "Item to assign")
            .required("user_id", ParamType::Integer, "User who becomes the owner"),
    )
    .with_description("Set the people column of an item to one user")
    .invalidates([
        CacheInvalidation::resource("board_items"),
        CacheInvalidation::resource("user_workload"),
    ])
}

pub fn call(ws: &mut Workspace, args: &Map<String, Value>) -> anyhow::Result<Value> {
    let params: AssignParams = decode(args)?;
    let item = ws.assign_user(params.item_id, params.user_id)?;
    Ok(json!({
        "id": item.id,
        "name": item.name,
        "user_id": params.user_id,
        "message": "User assigned successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_moves_workload() {
        let mut ws = Workspace::sample();
        let args = json!({"item_id": 3, "user_id": 100});
        call(&mut ws, args.as_object().unwrap()).unwrap();
        assert_eq!(ws.user_workload(100).unwrap().total, 3);
        assert_eq!(ws.user_workload(101).unwrap().total, 0);
    }
}
