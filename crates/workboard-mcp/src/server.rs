//! Server construction: registry, handlers, limiter and cache bundled into
//! one instance shared by every connection.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::ResponseCache;
use crate::config::ServerConfig;
use crate::limiter::RateLimiter;
use crate::registry::{
    CapabilityDescriptor, CapabilityKind, CapabilityRegistry, Handler, HandlerSet,
    ResourceHandler, ToolHandler,
};
use crate::types::{McpError, McpResult};

/// Everything a dispatcher needs. Immutable after `build()` apart from the
/// limiter and cache, which guard their own state.
#[derive(Debug)]
pub struct McpServer {
    registry: CapabilityRegistry,
    handlers: HandlerSet,
    limiter: Arc<RateLimiter>,
    cache: ResponseCache,
    config: ServerConfig,
}

impl McpServer {
    pub fn builder(config: ServerConfig) -> ServerBuilder {
        ServerBuilder::new(config)
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn handlers(&self) -> &HandlerSet {
        &self.handlers
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Cache lifetime for a resource: config override, then the descriptor
    /// default. `None` means the resource is not cached.
    pub fn cache_ttl(&self, descriptor: &CapabilityDescriptor) -> Option<Duration> {
        let ttl = self
            .config
            .ttl_override(&descriptor.id)
            .or_else(|| descriptor.as_resource().and_then(|r| r.cache_ttl))?;
        (!ttl.is_zero()).then_some(ttl)
    }
}

/// Collects descriptors and their handlers. Registration errors are held
/// until `build()`.
pub struct ServerBuilder {
    config: ServerConfig,
    registry: CapabilityRegistry,
    handlers: HandlerSet,
    error: Option<McpError>,
}

impl ServerBuilder {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            registry: CapabilityRegistry::new(),
            handlers: HandlerSet::new(),
            error: None,
        }
    }

    fn register(mut self, descriptor: CapabilityDescriptor, handler: Option<Handler>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let id = descriptor.id.clone();
        match self.registry.register(descriptor) {
            Ok(()) => {
                if let Some(handler) = handler {
                    self.handlers.insert(&id, handler);
                }
            }
            Err(e) => self.error = Some(e),
        }
        self
    }

    fn expect_kind(mut self, descriptor: &CapabilityDescriptor, kind: CapabilityKind) -> Self {
        if self.error.is_none() && descriptor.kind() != kind {
            self.error = Some(McpError::InvalidDescriptor(format!(
                "'{}' is a {} descriptor, registered as {kind}",
                descriptor.id,
                descriptor.kind()
            )));
        }
        self
    }

    pub fn resource(
        self,
        descriptor: CapabilityDescriptor,
        handler: impl ResourceHandler + 'static,
    ) -> Self {
        self.expect_kind(&descriptor, CapabilityKind::Resource)
            .register(descriptor, Some(Handler::Resource(Arc::new(handler))))
    }

    pub fn tool(
        self,
        descriptor: CapabilityDescriptor,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        self.expect_kind(&descriptor, CapabilityKind::Tool)
            .register(descriptor, Some(Handler::Tool(Arc::new(handler))))
    }

    /// Prompts are data only and take no handler.
    pub fn prompt(self, descriptor: CapabilityDescriptor) -> Self {
        self.expect_kind(&descriptor, CapabilityKind::Prompt)
            .register(descriptor, None)
    }

    pub fn build(self) -> McpResult<McpServer> {
        if let Some(e) = self.error {
            return Err(e);
        }
        tracing::debug!(
            resources = self.registry.count(CapabilityKind::Resource),
            tools = self.registry.count(CapabilityKind::Tool),
            prompts = self.registry.count(CapabilityKind::Prompt),
            "Server built"
        );
        Ok(McpServer {
            limiter: RateLimiter::new(self.config.rate_limit.clone()),
            cache: ResponseCache::new(),
            registry: self.registry,
            handlers: self.handlers,
            config: self.config,
        })
    }
}
