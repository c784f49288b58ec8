//! Resources: notes.

use serde_json::{json, Map, Value};

use workboard::Workspace;

use crate::registry::CapabilityDescriptor;
use crate::server::ServerBuilder;
use crate::workspace::SharedWorkspace;

use super::{require_str, WorkspaceResource};

pub fn register(builder: ServerBuilder, workspace: &SharedWorkspace) -> ServerBuilder {
    builder
        .resource(
            CapabilityDescriptor::resource("notes", "Notes")
                .with_description("Summaries of every note"),
            WorkspaceResource::new(workspace, read_notes),
        )
        .resource(
            CapabilityDescriptor::resource("note", "Note")
                .with_description("Full content of one note (params: note_id)"),
            WorkspaceResource::new(workspace, read_note),
        )
}

fn read_notes(ws: &Workspace, _params: &Map<String, Value>) -> anyhow::Result<Value> {
    let notes = ws.search_notes("", &[]);
    Ok(json!({ "count": notes.len(), "notes": notes }))
}

fn read_note(ws: &Workspace, params: &Map<String, Value>) -> anyhow::Result<Value> {
    let note_id = require_str(params, "note_id")?;
    Ok(serde_json::to_value(ws.note(note_id)?)?)
}
