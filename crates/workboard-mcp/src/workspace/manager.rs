//! Workspace lifecycle, snapshot file I/O and dirty tracking.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use workboard::{SnapshotReader, SnapshotWriter, Workspace};

use crate::types::{McpError, McpResult};

const DEFAULT_AUTO_SAVE_SECS: u64 = 30;

/// Handle shared between all workboard resource and tool handlers.
pub type SharedWorkspace = Arc<Mutex<WorkspaceManager>>;

/// Owns the in-memory workspace and persists it to its snapshot file.
pub struct WorkspaceManager {
    workspace: Workspace,
    file_path: Option<PathBuf>,
    dirty: bool,
    last_save: Instant,
    auto_save_interval: Duration,
}

impl WorkspaceManager {
    /// Open a snapshot file, or seed a new one with sample data when the
    /// file does not exist yet.
    pub fn open(path: &str) -> McpResult<Self> {
        let file_path = PathBuf::from(path);

        let (workspace, dirty) = if file_path.exists() {
            tracing::info!("Opening existing board snapshot: {}", file_path.display());
            let ws = SnapshotReader::read_from_file(&file_path)
                .map_err(|e| McpError::Config(format!("Failed to read board snapshot: {e}")))?;
            (ws, false)
        } else {
            tracing::info!("Creating new board snapshot: {}", file_path.display());
            if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    McpError::Io(std::io::Error::other(format!(
                        "Failed to create directory {}: {e}",
                        parent.display()
                    )))
                })?;
            }
            (Workspace::sample(), true)
        };

        tracing::info!(
            "Workspace has {} boards, {} items, {} notes",
            workspace.boards().len(),
            workspace.items.len(),
            workspace.notes().len()
        );

        Ok(Self {
            workspace,
            file_path: Some(file_path),
            dirty,
            last_save: Instant::now(),
            auto_save_interval: Duration::from_secs(DEFAULT_AUTO_SAVE_SECS),
        })
    }

    /// A manager with no backing file. `save` is a no-op.
    pub fn in_memory(workspace: Workspace) -> Self {
        Self {
            workspace,
            file_path: None,
            dirty: false,
            last_save: Instant::now(),
            auto_save_interval: Duration::from_secs(DEFAULT_AUTO_SAVE_SECS),
        }
    }

    pub fn into_shared(self) -> SharedWorkspace {
        Arc::new(Mutex::new(self))
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Mutable access. Marks the workspace dirty.
    pub fn workspace_mut(&mut self) -> &mut Workspace {
        self.dirty = true;
        &mut self.workspace
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the snapshot if anything changed.
    pub fn save(&mut self) -> McpResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let Some(path) = &self.file_path else {
            self.dirty = false;
            return Ok(());
        };

        SnapshotWriter::write_to_file(&self.workspace, path).map_err(|e| {
            McpError::Io(std::io::Error::other(format!(
                "Failed to write snapshot: {e}"
            )))
        })?;

        self.dirty = false;
        self.last_save = Instant::now();
        tracing::debug!("Saved board snapshot to {}", path.display());
        Ok(())
    }

    /// Save when dirty and the auto-save interval has passed.
    pub fn maybe_auto_save(&mut self) -> McpResult<()> {
        if self.dirty && self.last_save.elapsed() >= self.auto_save_interval {
            self.save()?;
        }
        Ok(())
    }
}

impl Drop for WorkspaceManager {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.save() {
                tracing::error!("Failed to save on drop: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_file_seeded_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/board.json");
        let mut manager = WorkspaceManager::open(path.to_str().unwrap()).unwrap();
        assert!(manager.is_dirty());
        assert_eq!(manager.workspace().boards().len(), 2);

        manager.save().unwrap();
        assert!(!manager.is_dirty());
        assert!(path.exists());

        let reopened = WorkspaceManager::open(path.to_str().unwrap()).unwrap();
        assert!(!reopened.is_dirty());
        assert_eq!(reopened.workspace().items.len(), 3);
    }

    #[test]
    fn test_mutation_persisted_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        {
            let mut manager = WorkspaceManager::open(path.to_str().unwrap()).unwrap();
            manager
                .workspace_mut()
                .create_note("Retro", "Went well", vec![])
                .unwrap();
        }
        let reopened = WorkspaceManager::open(path.to_str().unwrap()).unwrap();
        assert!(reopened
            .workspace()
            .notes()
            .iter()
            .any(|n| n.title == "Retro"));
    }

    #[test]
    fn test_corrupt_snapshot_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(WorkspaceManager::open(path.to_str().unwrap()).is_err());
    }
}
