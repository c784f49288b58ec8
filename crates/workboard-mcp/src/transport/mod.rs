//! Transport layer for MCP communication.

pub mod channel;
pub mod framing;
#[cfg(feature = "sse")]
pub mod sse;
pub mod stdio;

pub use channel::ChannelTransport;
#[cfg(feature = "sse")]
pub use sse::SseTransport;
pub use stdio::StdioTransport;
