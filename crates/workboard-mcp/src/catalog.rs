//! The workboard handler set: every resource, tool and prompt this server
//! exposes, bound to one shared workspace.

use crate::config::ServerConfig;
use crate::server::McpServer;
use crate::types::McpResult;
use crate::workspace::SharedWorkspace;
use crate::{prompts, resources, tools};

pub fn build_server(config: ServerConfig, workspace: &SharedWorkspace) -> McpResult<McpServer> {
    let builder = McpServer::builder(config);
    let builder = resources::register_all(builder, workspace);
    let builder = tools::register_all(builder, workspace);
    prompts::register_all(builder).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CacheInvalidation, CapabilityKind};
    use crate::workspace::WorkspaceManager;
    use workboard::Workspace;

    #[test]
    fn test_catalog_registers_everything_once() {
        let ws = WorkspaceManager::in_memory(Workspace::sample()).into_shared();
        let server = build_server(ServerConfig::default(), &ws).unwrap();
        let registry = server.registry();
        assert_eq!(registry.count(CapabilityKind::Resource), 10);
        assert_eq!(registry.count(CapabilityKind::Tool), 7);
        assert_eq!(registry.count(CapabilityKind::Prompt), 3);
        assert_eq!(server.handlers().len(), 17);

        let ids: Vec<&str> = registry
            .list(CapabilityKind::Resource)
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(
            ids,
            [
                "boards",
                "board_structure",
                "board_items",
                "items_by_status",
                "overdue_items",
                "item_updates",
                "user_details",
                "user_workload",
                "notes",
                "note",
            ]
        );
    }

    #[test]
    fn test_invalidation_targets_exist() {
        let ws = WorkspaceManager::in_memory(Workspace::sample()).into_shared();
        let server = build_server(ServerConfig::default(), &ws).unwrap();
        let registry = server.registry();
        for tool in registry.list(CapabilityKind::Tool) {
            for target in &tool.as_tool().unwrap().invalidates {
                let resource = match target {
                    CacheInvalidation::Resource(r) => r,
                    CacheInvalidation::Scoped { resource, .. } => resource,
                    CacheInvalidation::All => continue,
                };
                assert!(
                    registry.contains(CapabilityKind::Resource, resource),
                    "{} invalidates unknown resource {resource}",
                    tool.id
                );
            }
        }
    }
}
