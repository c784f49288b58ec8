//! Capability registry: the descriptors a server exposes, by kind, in
//! registration order.

pub mod descriptor;
pub mod handler;
pub mod schema;

use std::collections::HashMap;

pub use descriptor::{
    CacheInvalidation, CapabilityDescriptor, CapabilityKind, CapabilitySpec, FieldOption,
    PromptField, PromptSpec, PromptStep, ResourceSpec, StepType, ToolSpec,
};
pub use handler::{FnResource, FnTool, Handler, HandlerSet, ResourceHandler, ToolHandler};
pub use schema::{ParamSchema, ParamSpec, ParamType, ParamViolation};

use crate::types::{
    McpError, McpResult, PromptDefinition, ResourceDefinition, ToolDefinition,
};

#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    entries: Vec<CapabilityDescriptor>,
    index: HashMap<(CapabilityKind, String), usize>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. Ids are unique per kind; the same id may appear
    /// under different kinds.
    pub fn register(&mut self, descriptor: CapabilityDescriptor) -> McpResult<()> {
        if descriptor.id.is_empty() {
            return Err(McpError::InvalidDescriptor(format!(
                "{} id must not be empty",
                descriptor.kind()
            )));
        }
        if let Some(tool) = descriptor.as_tool() {
            tool.params.check_unique()?;
        }

        let key = (descriptor.kind(), descriptor.id.clone());
        if self.index.contains_key(&key) {
            return Err(McpError::DuplicateCapability {
                kind: key.0,
                id: key.1,
            });
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(descriptor);
        Ok(())
    }

    /// Descriptors of one kind in registration order.
    pub fn list(&self, kind: CapabilityKind) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.entries.iter().filter(move |d| d.kind() == kind)
    }

    pub fn resolve(&self, kind: CapabilityKind, id: &str) -> McpResult<&CapabilityDescriptor> {
        self.index
            .get(&(kind, id.to_string()))
            .map(|&i| &self.entries[i])
            .ok_or_else(|| McpError::UnknownCapability {
                kind,
                id: id.to_string(),
            })
    }

    pub fn contains(&self, kind: CapabilityKind, id: &str) -> bool {
        self.index.contains_key(&(kind, id.to_string()))
    }

    pub fn count(&self, kind: CapabilityKind) -> usize {
        self.list(kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.list(CapabilityKind::Tool)
            .filter_map(|d| {
                let tool = d.as_tool()?;
                Some(ToolDefinition {
                    name: d.id.clone(),
                    title: Some(d.name.clone()),
                    description: d.description.clone(),
                    input_schema: tool.params.to_json_schema(),
                    side_effects: tool.side_effects,
                })
            })
            .collect()
    }

    pub fn resource_definitions(&self) -> Vec<ResourceDefinition> {
        self.list(CapabilityKind::Resource)
            .filter_map(|d| {
                let resource = d.as_resource()?;
                Some(ResourceDefinition {
                    uri: d.id.clone(),
                    name: d.name.clone(),
                    description: d.description.clone(),
                    mime_type: resource.mime_type.clone(),
                })
            })
            .collect()
    }

    pub fn prompt_definitions(&self) -> Vec<PromptDefinition> {
        self.list(CapabilityKind::Prompt)
            .filter_map(|d| {
                let prompt = d.as_prompt()?;
                Some(PromptDefinition {
                    name: d.id.clone(),
                    title: Some(d.name.clone()),
                    description: d.description.clone(),
                    step_count: prompt.steps.len(),
                })
            })
            .collect()
    }
}
