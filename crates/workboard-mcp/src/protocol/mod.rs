//! MCP protocol handling: JSON-RPC dispatch and the connection lifecycle.

pub mod handler;
pub mod method;
pub mod negotiation;
pub mod session;
pub mod validator;

pub use handler::ProtocolHandler;
pub use method::Method;
pub use session::{ConnectionSession, SessionState};
