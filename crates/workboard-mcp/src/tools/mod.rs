//! MCP tool implementations over the board workspace.

pub mod add_update_to_item;
pub mod assign_user_to_item;
pub mod create_item;
pub mod create_note;
pub mod search_notes;
pub mod update_item_status;
pub mod update_note;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use workboard::Workspace;

use crate::registry::{CapabilityDescriptor, ToolHandler};
use crate::server::ServerBuilder;
use crate::workspace::SharedWorkspace;

type Args = Map<String, Value>;

/// How a tool touches the workspace.
#[derive(Clone, Copy)]
pub enum ToolFn {
    Query(fn(&Workspace, &Args) -> anyhow::Result<Value>),
    Mutation(fn(&mut Workspace, &Args) -> anyhow::Result<Value>),
}

/// A tool that runs against the shared workspace under its lock.
pub struct WorkspaceTool {
    workspace: SharedWorkspace,
    call: ToolFn,
}

impl WorkspaceTool {
    pub fn new(workspace: &SharedWorkspace, call: ToolFn) -> Self {
        Self {
            workspace: workspace.clone(),
            call,
        }
    }
}

#[async_trait]
impl ToolHandler for WorkspaceTool {
    async fn call(&self, name: &str, args: &Args) -> anyhow::Result<Value> {
        let mut manager = self.workspace.lock().await;
        match self.call {
            ToolFn::Query(f) => f(manager.workspace(), args),
            ToolFn::Mutation(f) => {
                let result = f(manager.workspace_mut(), args)?;
                tracing::debug!(tool = name, "Workspace mutated");
                if let Err(e) = manager.maybe_auto_save() {
                    tracing::warn!("Auto-save failed: {e}");
                }
                Ok(result)
            }
        }
    }
}

/// Register every workboard tool, in listing order.
pub fn register_all(builder: ServerBuilder, workspace: &SharedWorkspace) -> ServerBuilder {
    let tools: [(CapabilityDescriptor, ToolFn); 7] = [
        (create_item::descriptor(), ToolFn::Mutation(create_item::call)),
        (update_item_status::descriptor(), ToolFn::Mutation(update_item_status::call)),
        (assign_user_to_item::descriptor(), ToolFn::Mutation(assign_user_to_item::call)),
        (add_update_to_item::descriptor(), ToolFn::Mutation(add_update_to_item::call)),
        (create_note::descriptor(), ToolFn::Mutation(create_note::call)),
        (update_note::descriptor(), ToolFn::Mutation(update_note::call)),
        (search_notes::descriptor(), ToolFn::Query(search_notes::call)),
    ];
    tools.into_iter().fold(builder, |b, (descriptor, call)| {
        b.tool(descriptor, WorkspaceTool::new(workspace, call))
    })
}

/// Decode already-validated arguments into a typed parameter struct.
pub(crate) fn decode<T: DeserializeOwned>(args: &Map<String, Value>) -> anyhow::Result<T> {
    serde_json::from_value(Value::Object(args.clone()))
        .map_err(|e| anyhow::anyhow!("invalid arguments: {e}"))
}
