//! Core data types for boards, items, users and notes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type BoardId = u64;
pub type ItemId = u64;
pub type UserId = u64;

/// A project board with its column layout and item groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    pub description: Option<String>,
    pub state: BoardState,
    pub board_kind: String,
    pub columns: Vec<Column>,
    pub groups: Vec<Group>,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    /// First column of the given type, in layout order.
    pub fn column_of(&self, column_type: ColumnType) -> Option<&Column> {
        self.columns.iter().find(|c| c.column_type == column_type)
    }

    /// The group new items land in when none is named.
    pub fn default_group(&self) -> Option<&Group> {
        self.groups.iter().min_by_key(|g| g.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardState {
    Active,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Status,
    Date,
    People,
    Numbers,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnType::Text => "text",
            ColumnType::Status => "status",
            ColumnType::Date => "date",
            ColumnType::People => "people",
            ColumnType::Numbers => "numbers",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub title: String,
    pub color: String,
    pub position: u32,
}

/// Column layout of a board, as returned by a structure query.
#[derive(Debug, Clone, Serialize)]
pub struct BoardStructure<'a> {
    pub board_id: BoardId,
    pub columns: &'a [Column],
    pub groups: &'a [Group],
}

/// A row on a board. Column values are keyed by column id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub board_id: BoardId,
    pub group_id: String,
    pub name: String,
    pub column_values: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Status label stored in `column_id`, if any.
    ///
    /// Accepts both `{"label": "Done"}` and a bare string.
    pub fn status_label(&self, column_id: &str) -> Option<&str> {
        match self.column_values.get(column_id)? {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map.get("label").and_then(Value::as_str),
            _ => None,
        }
    }

    /// User ids assigned through the people column `column_id`.
    pub fn assignees(&self, column_id: &str) -> Vec<UserId> {
        self.column_values
            .get(column_id)
            .and_then(|v| v.get("personsAndTeams"))
            .and_then(Value::as_array)
            .map(|people| {
                people
                    .iter()
                    .filter_map(|p| p.get("id").and_then(Value::as_u64))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Fields accepted when creating an item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewItem {
    pub board_id: BoardId,
    pub item_name: String,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub column_values: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub title: Option<String>,
}

/// A comment posted on an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub id: u64,
    pub item_id: ItemId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Items assigned to one user, grouped by status label.
#[derive(Debug, Clone, Serialize)]
pub struct Workload {
    pub user: User,
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub items: Vec<WorkloadItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkloadItem {
    pub id: ItemId,
    pub board_id: BoardId,
    pub name: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a note; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Search hit with a shortened content preview.
#[derive(Debug, Clone, Serialize)]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Errors that can occur in the board store.
#[derive(thiserror::Error, Debug)]
pub enum BoardError {
    #[error("Board not found: {0}")]
    BoardNotFound(BoardId),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Group '{group}' not found on board {board_id}")]
    GroupNotFound { board_id: BoardId, group: String },

    #[error("Board {board_id} has no {column_type} column")]
    MissingColumn {
        board_id: BoardId,
        column_type: ColumnType,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type BoardResult<T> = Result<T, BoardError>;
