//! Workboard MCP server: capability negotiation plus rate-limited and
//! cached dispatch of resources, tools and prompts over project boards.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod limiter;
pub mod prompts;
pub mod protocol;
pub mod registry;
pub mod repl;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;
pub mod workspace;

pub use cache::{CacheKey, ResponseCache};
pub use catalog::build_server;
pub use config::{resolve_data_path, ServerConfig};
pub use limiter::{Permit, RateLimitConfig, RateLimiter};
pub use protocol::ProtocolHandler;
pub use registry::CapabilityRegistry;
pub use server::{McpServer, ServerBuilder};
pub use transport::{ChannelTransport, StdioTransport};
pub use workspace::{SharedWorkspace, WorkspaceManager};
