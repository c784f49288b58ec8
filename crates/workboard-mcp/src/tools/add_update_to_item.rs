//! Tool: add_update_to_item. Post a comment on an item.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use workboard::Workspace;

use crate::registry::{CacheInvalidation, CapabilityDescriptor, ParamSchema, ParamType};

use super::decode;

#[derive(Debug, Deserialize)]
struct AddUpdateParams {
    item_id: u64,
    update_text: String,
}

pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::tool(
        "add_update_to_item",
        "Add update to item",
        ParamSchema::new()
            .required("item_id", ParamType::Integer, "Item to comment on")
            .required("update_text", ParamType::String, "Body of the update"),
    )
    .with_description("Add an update (comment) to an item")
    .invalidates([CacheInvalidation::scoped("item_updates", &["item_id"])])
}

pub fn call(ws: &mut Workspace, args: &Map<String, Value>) -> anyhow::Result<Value> {
    let params: AddUpdateParams = decode(args)?;
    let update = ws.add_update(params.item_id, &params.update_text)?;
    Ok(json!({
        "id": update.id,
        "item_id": update.item_id,
        "message": "Update added successfully",
    }))
}
