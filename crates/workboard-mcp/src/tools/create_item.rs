//! Tool: create_item. Create an item on a board.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use workboard::{NewItem, Workspace};

use crate::registry::{CacheInvalidation, CapabilityDescriptor, ParamSchema, ParamType};

use super::decode;

#[derive(Debug, Deserialize)]
struct CreateItemParams {
    board_id: u64,
    item_name: String,
    #[serde(default)]
    group_id: Option<String>,
    #[serde(default)]
    column_values: Option<BTreeMap<String, Value>>,
}

pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::tool(
        "create_item",
        "Create item",
        ParamSchema::new()
            .required("board_id", ParamType::Integer, "Board to create the item on")
            .required("item_name", ParamType::String, "Name of the new item")
            .optional(
                "group_id",
                ParamType::String,
                "Group id; defaults to the board's first group",
            )
            .optional(
                "column_values",
                ParamType::Object,
                "Initial column values keyed by column id",
            ),
    )
    .with_description("Create a new item on a board")
    .invalidates([
        CacheInvalidation::scoped("board_items", &["board_id"]),
        CacheInvalidation::resource("items_by_status"),
        CacheInvalidation::resource("overdue_items"),
        CacheInvalidation::resource("user_workload"),
        CacheInvalidation::resource("boards"),
    ])
}

pub fn call(ws: &mut Workspace, args: &Map<String, Value>) -> anyhow::Result<Value> {
    let params: CreateItemParams = decode(args)?;
    let item = ws.create_item(NewItem {
        board_id: params.board_id,
        item_name: params.item_name,
        group_id: params.group_id,
        column_values: params.column_values.unwrap_or_default(),
    })?;
    Ok(json!({
        "id": item.id,
        "name": item.name,
        "board_id": item.board_id,
        "group_id": item.group_id,
        "message": "Item created successfully",
    }))
}
