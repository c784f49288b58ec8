//! Tool: update_note. Patch title, content or tags of a note.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use workboard::{NotePatch, Workspace};

use crate::registry::{CacheInvalidation, CapabilityDescriptor, ParamSchema, ParamType};

use super::decode;

#[derive(Debug, Deserialize)]
struct UpdateNoteParams {
    note_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::tool(
        "update_note",
        "Update note",
        ParamSchema::new()
            .required("note_id", ParamType::String, "ID of the note to update")
            .optional("title", ParamType::String, "New title")
            .optional("content", ParamType::String, "New content")
            .optional("tags", ParamType::Array, "Replacement tag list"),
    )
    .with_description("Update an existing note")
    .invalidates([
        CacheInvalidation::resource("notes"),
        CacheInvalidation::scoped("note", &["note_id"]),
    ])
}

pub fn call(ws: &mut Workspace, args: &Map<String, Value>) -> anyhow::Result<Value> {
    let params: UpdateNoteParams = decode(args)?;
    let note = ws.update_note(
        &params.note_id,
        NotePatch {
            title: params.title,
            content: params.content,
            tags: params.tags,
        },
    )?;
    Ok(json!({
        "id": note.id,
        "title": note.title,
        "message": "Note updated successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_keeps_untouched_fields() {
        let mut ws = Workspace::sample();
        let args = json!({"note_id": "note-1", "title": "Hello"});
        call(&mut ws, args.as_object().unwrap()).unwrap();
        let note = ws.note("note-1").unwrap();
        assert_eq!(note.title, "Hello");
        assert_eq!(note.tags, vec!["welcome", "introduction"]);
    }
}
