//! Board snapshot lifecycle shared by the workboard handlers.

pub mod manager;

pub use manager::{SharedWorkspace, WorkspaceManager};
