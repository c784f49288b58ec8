//! Tool: create_note.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use workboard::Workspace;

use crate::registry::{CacheInvalidation, CapabilityDescriptor, ParamSchema, ParamType};

use super::decode;

#[derive(Debug, Deserialize)]
struct CreateNoteParams {
    title: String,
    content: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::tool(
        "create_note",
        "Create note",
        ParamSchema::new()
            .required("title", ParamType::String, "Title of the note")
            .required("content", ParamType::String, "Content of the note")
            .optional("tags", ParamType::Array, "Tags for categorizing the note"),
    )
    .with_description("Create a new note")
    .invalidates([CacheInvalidation::resource("notes")])
}

pub fn call(ws: &mut Workspace, args: &Map<String, Value>) -> anyhow::Result<Value> {
    let params: CreateNoteParams = decode(args)?;
    let note = ws.create_note(&params.title, &params.content, params.tags.unwrap_or_default())?;
    Ok(json!({
        "id": note.id,
        "title": note.title,
        "message": "Note created successfully",
    }))
}
