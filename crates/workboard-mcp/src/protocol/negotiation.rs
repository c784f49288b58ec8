//! MCP capability negotiation during initialization.

use crate::registry::{CapabilityKind, CapabilityRegistry};
use crate::types::{InitializeParams, MCP_VERSION, SUPPORTED_KINDS};

/// Kinds the server supports that also have at least one registered entry,
/// in `SUPPORTED_KINDS` order.
pub fn negotiate(registry: &CapabilityRegistry) -> Vec<CapabilityKind> {
    SUPPORTED_KINDS
        .iter()
        .copied()
        .filter(|&kind| registry.count(kind) > 0)
        .collect()
}

pub fn check_version(params: &InitializeParams) {
    if params.protocol_version != MCP_VERSION {
        tracing::warn!(
            "Client requested protocol version {}, server supports {}. Proceeding with server version.",
            params.protocol_version,
            MCP_VERSION
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CapabilityDescriptor, ParamSchema};

    #[test]
    fn test_empty_kinds_not_negotiated() {
        let mut registry = CapabilityRegistry::new();
        assert!(negotiate(&registry).is_empty());

        registry
            .register(CapabilityDescriptor::tool("t", "T", ParamSchema::new()))
            .unwrap();
        assert_eq!(negotiate(&registry), vec![CapabilityKind::Tool]);

        registry
            .register(CapabilityDescriptor::prompt("p", "P", Vec::new()))
            .unwrap();
        registry
            .register(CapabilityDescriptor::resource("r", "R"))
            .unwrap();
        assert_eq!(
            negotiate(&registry),
            vec![
                CapabilityKind::Resource,
                CapabilityKind::Tool,
                CapabilityKind::Prompt
            ]
        );
    }
}
