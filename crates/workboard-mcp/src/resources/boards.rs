//! Resources: boards, board structure, item queries and item updates.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde_json::{json, Map, Value};

use workboard::Workspace;

use crate::registry::CapabilityDescriptor;
use crate::server::ServerBuilder;
use crate::workspace::SharedWorkspace;

use super::{require_str, require_u64, WorkspaceResource};

pub fn register(builder: ServerBuilder, workspace: &SharedWorkspace) -> ServerBuilder {
    builder
        .resource(
            CapabilityDescriptor::resource("boards", "Boards")
                .with_description("All boards with their id, name, state and kind")
                .with_cache_ttl(Duration::from_secs(300)),
            WorkspaceResource::new(workspace, read_boards),
        )
        .resource(
            CapabilityDescriptor::resource("board_structure", "Board structure")
                .with_description("Columns and groups of a board (params: board_id)")
                .with_cache_ttl(Duration::from_secs(300)),
            WorkspaceResource::new(workspace, read_structure),
        )
        .resource(
            CapabilityDescriptor::resource("board_items", "Board items")
                .with_description("Items on a board with their column values (params: board_id)")
                .with_cache_ttl(Duration::from_secs(60)),
            WorkspaceResource::new(workspace, read_items),
        )
        .resource(
            CapabilityDescriptor::resource("items_by_status", "Items by status")
                .with_description(
                    "Items on a board whose status matches (params: board_id, status)",
                ),
            WorkspaceResource::new(workspace, read_items_by_status),
        )
        .resource(
            CapabilityDescriptor::resource("overdue_items", "Overdue items")
                .with_description("Items past their due date that are not done (params: as_of?)"),
            WorkspaceResource::new(workspace, read_overdue),
        )
        .resource(
            CapabilityDescriptor::resource("item_updates", "Item updates")
                .with_description("Updates posted on an item, oldest first (params: item_id)")
                .with_cache_ttl(Duration::from_secs(60)),
            WorkspaceResource::new(workspace, read_updates),
        )
}

fn read_boards(ws: &Workspace, _params: &Map<String, Value>) -> anyhow::Result<Value> {
    let boards: Vec<Value> = ws
        .boards()
        .iter()
        .map(|b| {
            json!({
                "id": b.id,
                "name": b.name,
                "description": b.description,
                "state": b.state,
                "board_kind": b.board_kind,
                "updated_at": b.updated_at,
            })
        })
        .collect();
    Ok(json!({ "boards": boards }))
}

fn read_structure(ws: &Workspace, params: &Map<String, Value>) -> anyhow::Result<Value> {
    let board_id = require_u64(params, "board_id")?;
    Ok(serde_json::to_value(ws.board_structure(board_id)?)?)
}

fn read_items(ws: &Workspace, params: &Map<String, Value>) -> anyhow::Result<Value> {
    let board_id = require_u64(params, "board_id")?;
    let items = ws.items_by_board(board_id)?;
    Ok(json!({ "board_id": board_id, "count": items.len(), "items": items }))
}

fn read_items_by_status(ws: &Workspace, params: &Map<String, Value>) -> anyhow::Result<Value> {
    let board_id = require_u64(params, "board_id")?;
    let status = require_str(params, "status")?;
    let items = ws.items_by_status(board_id, status)?;
    Ok(json!({ "board_id": board_id, "status": status, "items": items }))
}

fn read_updates(ws: &Workspace, params: &Map<String, Value>) -> anyhow::Result<Value> {
    let item_id = require_u64(params, "item_id")?;
    ws.item(item_id)?;
    let updates = ws.updates_for(item_id);
    Ok(json!({ "item_id": item_id, "count": updates.len(), "updates": updates }))
}

fn read_overdue(ws: &Workspace, params: &Map<String, Value>) -> anyhow::Result<Value> {
    let today = match params.get("as_of").and_then(Value::as_str) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("parameter 'as_of' must be YYYY-MM-DD: {e}"))?,
        None => Utc::now().date_naive(),
    };
    let items = ws.overdue_items(today);
    Ok(json!({ "as_of": today.to_string(), "count": items.len(), "items": items }))
}
