//! Workboard: in-memory project boards, items, users and notes.

pub mod storage;
pub mod types;
pub mod workspace;

pub use storage::{SnapshotReader, SnapshotWriter};
pub use types::*;
pub use workspace::Workspace;
