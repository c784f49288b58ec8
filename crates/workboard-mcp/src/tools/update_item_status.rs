//! Tool: update_item_status. Set an item's status label.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use workboard::Workspace;

use crate::registry::{CacheInvalidation, CapabilityDescriptor, ParamSchema, ParamType};

use super::decode;

#[derive(Debug, Deserialize)]
struct UpdateStatusParams {
    item_id: u64,
    new_status: String,
}

pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::tool(
        "update_item_status",
        "Update item status",
        ParamSchema::new()
            .required("item_id", ParamType::Integer, "Item to update")
            .required("new_status", ParamType::String, "New status label, e.g. \"Done\""),
    )
    .with_description("Update the status column of an item")
    .invalidates([
        CacheInvalidation::resource("board_items"),
        CacheInvalidation::resource("items_by_status"),
        CacheInvalidation::resource("overdue_items"),
        CacheInvalidation::resource("user_workload"),
    ])
}

pub fn call(ws: &mut Workspace, args: &Map<String, Value>) -> anyhow::Result<Value> {
    let params: UpdateStatusParams = decode(args)?;
    let item = ws.update_item_status(params.item_id, &params.new_status)?;
    Ok(json!({
        "id": item.id,
        "name": item.name,
        "status": params.new_status,
        "message": "Status updated successfully",
    }))
}
