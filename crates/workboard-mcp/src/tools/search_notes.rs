//! Tool: search_notes.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use workboard::Workspace;

use crate::registry::{CapabilityDescriptor, ParamSchema, ParamType};

use super::decode;

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::tool(
        "search_notes",
        "Search notes",
        ParamSchema::new()
            .optional("query", ParamType::String, "Text to find in title or content")
            .optional("tags", ParamType::Array, "Only notes carrying all of these tags"),
    )
    .with_description("Search notes by content or tags")
}

pub fn call(ws: &Workspace, args: &Map<String, Value>) -> anyhow::Result<Value> {
    let params: SearchParams = decode(args)?;
    let results = ws.search_notes(
        params.query.as_deref().unwrap_or_default(),
        &params.tags.unwrap_or_default(),
    );
    Ok(json!({ "count": results.len(), "results": results }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_by_query_and_tag() {
        let ws = Workspace::sample();
        let args = json!({"query": "milk"});
        let v = call(&ws, args.as_object().unwrap()).unwrap();
        assert_eq!(v["count"], 1);
        assert_eq!(v["results"][0]["id"], "note-2");

        let args = json!({"tags": ["welcome", "shopping"]});
        let v = call(&ws, args.as_object().unwrap()).unwrap();
        assert_eq!(v["count"], 0);

        let v = call(&ws, &Map::new()).unwrap();
        assert_eq!(v["count"], 2);
    }
}
