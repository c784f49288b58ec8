//! Handler traits and the map from capability to implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::CapabilityKind;

/// Produces the payload for a resource read.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn read(&self, id: &str, params: &Map<String, Value>) -> anyhow::Result<Value>;
}

/// Executes a tool call. Arguments have already passed schema validation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, name: &str, args: &Map<String, Value>) -> anyhow::Result<Value>;
}

#[derive(Clone)]
pub enum Handler {
    Resource(Arc<dyn ResourceHandler>),
    Tool(Arc<dyn ToolHandler>),
}

impl Handler {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Handler::Resource(_) => CapabilityKind::Resource,
            Handler::Tool(_) => CapabilityKind::Tool,
        }
    }
}

/// Handlers keyed by `(kind, id)`. Prompts need none.
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: HashMap<(CapabilityKind, String), Handler>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, handler: Handler) {
        self.handlers.insert((handler.kind(), id.to_string()), handler);
    }

    pub fn resource(&self, id: &str) -> Option<Arc<dyn ResourceHandler>> {
        match self.handlers.get(&(CapabilityKind::Resource, id.to_string())) {
            Some(Handler::Resource(h)) => Some(Arc::clone(h)),
            _ => None,
        }
    }

    pub fn tool(&self, id: &str) -> Option<Arc<dyn ToolHandler>> {
        match self.handlers.get(&(CapabilityKind::Tool, id.to_string())) {
            Some(Handler::Tool(h)) => Some(Arc::clone(h)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.handlers.keys().collect();
        keys.sort();
        f.debug_struct("HandlerSet").field("handlers", &keys).finish()
    }
}

/// Adapter so closures can serve as resource handlers.
pub struct FnResource<F>(pub F);

impl<F> FnResource<F>
where
    F: Fn(&Map<String, Value>) -> anyhow::Result<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> ResourceHandler for FnResource<F>
where
    F: Fn(&Map<String, Value>) -> anyhow::Result<Value> + Send + Sync,
{
    async fn read(&self, _id: &str, params: &Map<String, Value>) -> anyhow::Result<Value> {
        (self.0)(params)
    }
}

/// Adapter so closures can serve as tool handlers.
pub struct FnTool<F>(pub F);

impl<F> FnTool<F>
where
    F: Fn(&Map<String, Value>) -> anyhow::Result<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> ToolHandler for FnTool<F>
where
    F: Fn(&Map<String, Value>) -> anyhow::Result<Value> + Send + Sync,
{
    async fn call(&self, _name: &str, args: &Map<String, Value>) -> anyhow::Result<Value> {
        (self.0)(args)
    }
}
