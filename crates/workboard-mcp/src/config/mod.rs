//! Configuration loading and resolution.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::limiter::RateLimitConfig;
use crate::types::{McpError, McpResult};

pub const CONFIG_ENV: &str = "WORKBOARD_MCP_CONFIG";
pub const DATA_ENV: &str = "WORKBOARD_DATA";

/// Options consumed by the server core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub rate_limit: RateLimitConfig,
    /// Per-resource TTL overrides. Zero disables caching for that resource.
    pub cache_ttl_seconds_by_resource: BTreeMap<String, u64>,
}

impl ServerConfig {
    pub fn from_json(json: &str) -> McpResult<Self> {
        serde_json::from_str(json).map_err(|e| McpError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> McpResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| McpError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_json(&text)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the first source that applies: explicit path, the
    /// `WORKBOARD_MCP_CONFIG` variable, `./.workboard/mcp.json`. Defaults
    /// when none exists.
    pub fn resolve(explicit: Option<&str>) -> McpResult<Self> {
        match resolve_config_path(explicit) {
            Some(path) => Self::load(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn ttl_override(&self, resource: &str) -> Option<Duration> {
        self.cache_ttl_seconds_by_resource
            .get(resource)
            .map(|secs| Duration::from_secs(*secs))
    }
}

/// Resolve the config file path. Explicit and env paths are returned even
/// when missing so a typo surfaces as a load error.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(env_path));
    }

    let cwd_config = PathBuf::from(".workboard/mcp.json");
    cwd_config.exists().then_some(cwd_config)
}

/// Resolve the board snapshot path.
pub fn resolve_data_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Ok(env_path) = std::env::var(DATA_ENV) {
        return env_path;
    }

    let cwd_data = PathBuf::from(".workboard/board.json");
    if cwd_data.exists() {
        return cwd_data.display().to_string();
    }

    resolve_default_data_path()
}

fn resolve_default_data_path() -> String {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    format!("{home}/.workboard/board.json")
}
