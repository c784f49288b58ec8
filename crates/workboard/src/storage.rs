//! JSON snapshot reader/writer for a workspace.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{BoardError, BoardResult};
use crate::workspace::Workspace;

/// Format tag written into every snapshot.
const SNAPSHOT_FORMAT: &str = "workboard";

/// Current snapshot version.
const FORMAT_VERSION: u16 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format: &'a str,
    version: u16,
    workspace: &'a Workspace,
}

#[derive(Deserialize)]
struct Snapshot {
    format: String,
    version: u16,
    workspace: Workspace,
}

/// Writer for workspace snapshots.
pub struct SnapshotWriter;

/// Reader for workspace snapshots.
pub struct SnapshotReader;

impl SnapshotWriter {
    /// Write a workspace to a file, creating parent directories.
    pub fn write_to_file(workspace: &Workspace, path: &Path) -> BoardResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Written beside the target, then renamed over it.
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            Self::write_to(workspace, &mut file)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn write_to<W: Write>(workspace: &Workspace, writer: &mut W) -> BoardResult<()> {
        let snapshot = SnapshotRef {
            format: SNAPSHOT_FORMAT,
            version: FORMAT_VERSION,
            workspace,
        };
        serde_json::to_writer_pretty(&mut *writer, &snapshot)
            .map_err(|e| BoardError::Storage(format!("Serialization failed: {e}")))?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl SnapshotReader {
    pub fn read_from_file(path: &Path) -> BoardResult<Workspace> {
        let mut file = std::fs::File::open(path)?;
        Self::read_from(&mut file)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> BoardResult<Workspace> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        if buf.iter().all(u8::is_ascii_whitespace) {
            return Err(BoardError::Storage("Snapshot file is empty".to_string()));
        }

        let snapshot: Snapshot = serde_json::from_slice(&buf)
            .map_err(|e| BoardError::Storage(format!("Invalid snapshot: {e}")))?;

        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(BoardError::Storage(format!(
                "Invalid snapshot format tag '{}'",
                snapshot.format
            )));
        }
        if snapshot.version != FORMAT_VERSION {
            return Err(BoardError::Storage(format!(
                "Unsupported snapshot version: {}",
                snapshot.version
            )));
        }

        Ok(snapshot.workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_roundtrip_keeps_ids_advancing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("board.json");

        let ws = Workspace::sample();
        SnapshotWriter::write_to_file(&ws, &path).unwrap();

        let mut loaded = SnapshotReader::read_from_file(&path).unwrap();
        assert_eq!(loaded.boards().len(), 2);
        assert_eq!(loaded.items.len(), 3);

        let note = loaded.create_note("After reload", "body", vec![]).unwrap();
        assert_eq!(note.id, "note-3");
    }

    #[test]
    fn test_empty_snapshot_rejected() {
        let err = SnapshotReader::read_from(&mut "  \n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_wrong_version_rejected() {
        let raw = r#"{"format":"workboard","version":99,"workspace":{}}"#;
        let err = SnapshotReader::read_from(&mut raw.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Unsupported snapshot version"));
    }

    #[test]
    fn test_garbage_rejected() {
        let err = SnapshotReader::read_from(&mut "NOT JSON".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Invalid snapshot"));
    }
}
