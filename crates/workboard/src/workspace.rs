//! In-memory workspace holding boards, items, users, updates and notes.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::*;

const PREVIEW_CHARS: usize = 100;
const DONE_LABEL: &str = "done";

/// Everything the board backend knows about, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
    pub boards: Vec<Board>,
    pub items: Vec<Item>,
    pub users: Vec<User>,
    pub updates: Vec<ItemUpdate>,
    pub notes: Vec<Note>,
    next_item_id: ItemId,
    next_update_id: u64,
    next_note_id: u64,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self {
            next_item_id: 1,
            next_update_id: 1,
            next_note_id: 1,
            ..Self::default()
        }
    }

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn board(&self, id: BoardId) -> BoardResult<&Board> {
        self.boards
            .iter()
            .find(|b| b.id == id)
            .ok_or(BoardError::BoardNotFound(id))
    }

    pub fn add_board(&mut self, board: Board) {
        self.boards.push(board);
    }

    pub fn add_user(&mut self, user: User) {
        self.users.push(user);
    }

    pub fn board_structure(&self, id: BoardId) -> BoardResult<BoardStructure<'_>> {
        let board = self.board(id)?;
        Ok(BoardStructure {
            board_id: board.id,
            columns: &board.columns,
            groups: &board.groups,
        })
    }

    pub fn items_by_board(&self, id: BoardId) -> BoardResult<Vec<&Item>> {
        self.board(id)?;
        Ok(self.items.iter().filter(|i| i.board_id == id).collect())
    }

    /// Items whose status label matches `status`, ignoring case.
    pub fn items_by_status(&self, board_id: BoardId, status: &str) -> BoardResult<Vec<&Item>> {
        let board = self.board(board_id)?;
        let column = board
            .column_of(ColumnType::Status)
            .ok_or(BoardError::MissingColumn {
                board_id,
                column_type: ColumnType::Status,
            })?;

        Ok(self
            .items
            .iter()
            .filter(|i| i.board_id == board_id)
            .filter(|i| {
                i.status_label(&column.id)
                    .is_some_and(|label| label.eq_ignore_ascii_case(status))
            })
            .collect())
    }

    /// Items across all boards whose date column lies before `today`
    /// and whose status is not done.
    pub fn overdue_items(&self, today: NaiveDate) -> Vec<&Item> {
        let mut overdue = Vec::new();
        for board in &self.boards {
            let Some(date_col) = board.column_of(ColumnType::Date) else {
                continue;
            };
            let status_col = board.column_of(ColumnType::Status);

            for item in self.items.iter().filter(|i| i.board_id == board.id) {
                let due = item
                    .column_values
                    .get(&date_col.id)
                    .and_then(Value::as_str)
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
                let done = status_col
                    .and_then(|c| item.status_label(&c.id))
                    .is_some_and(|l| l.eq_ignore_ascii_case(DONE_LABEL));

                if due.is_some_and(|d| d < today) && !done {
                    overdue.push(item);
                }
            }
        }
        overdue
    }

    pub fn user(&self, id: UserId) -> BoardResult<&User> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or(BoardError::UserNotFound(id))
    }

    /// Items assigned to `id` through any board's people column.
    pub fn user_workload(&self, id: UserId) -> BoardResult<Workload> {
        let user = self.user(id)?.clone();
        let mut items = Vec::new();
        let mut by_status: BTreeMap<String, usize> = BTreeMap::new();

        for board in &self.boards {
            let Some(people_col) = board.column_of(ColumnType::People) else {
                continue;
            };
            let status_col = board.column_of(ColumnType::Status);

            for item in self.items.iter().filter(|i| i.board_id == board.id) {
                if !item.assignees(&people_col.id).contains(&id) {
                    continue;
                }
                let status = status_col
                    .and_then(|c| item.status_label(&c.id))
                    .map(str::to_string);
                *by_status
                    .entry(status.clone().unwrap_or_else(|| "none".to_string()))
                    .or_default() += 1;
                items.push(WorkloadItem {
                    id: item.id,
                    board_id: item.board_id,
                    name: item.name.clone(),
                    status,
                });
            }
        }

        Ok(Workload {
            user,
            total: items.len(),
            by_status,
            items,
        })
    }

    pub fn item(&self, id: ItemId) -> BoardResult<&Item> {
        self.items
            .iter()
            .find(|i| i.id == id)
            .ok_or(BoardError::ItemNotFound(id))
    }

    fn item_mut(&mut self, id: ItemId) -> BoardResult<&mut Item> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(BoardError::ItemNotFound(id))
    }

    /// Create an item and return it with its assigned id.
    pub fn create_item(&mut self, new: NewItem) -> BoardResult<&Item> {
        if new.item_name.trim().is_empty() {
            return Err(BoardError::InvalidInput(
                "item_name must not be empty".to_string(),
            ));
        }

        let board = self.board(new.board_id)?;
        let group_id = match new.group_id {
            Some(group) => {
                if !board.groups.iter().any(|g| g.id == group) {
                    return Err(BoardError::GroupNotFound {
                        board_id: board.id,
                        group,
                    });
                }
                group
            }
            None => board
                .default_group()
                .map(|g| g.id.clone())
                .ok_or_else(|| {
                    BoardError::InvalidInput(format!("Board {} has no groups", board.id))
                })?,
        };

        let now = Utc::now();
        let id = self.next_item_id.max(1);
        self.next_item_id = id + 1;
        self.items.push(Item {
            id,
            board_id: new.board_id,
            group_id,
            name: new.item_name,
            column_values: new.column_values,
            created_at: now,
            updated_at: now,
        });
        self.touch_board(new.board_id);

        tracing::debug!(item = id, board = new.board_id, "Created item");
        self.item(id)
    }

    pub fn update_item_status(&mut self, item_id: ItemId, new_status: &str) -> BoardResult<&Item> {
        let board_id = self.item(item_id)?.board_id;
        let column_id = self.column_id(board_id, ColumnType::Status)?;

        let item = self.item_mut(item_id)?;
        item.column_values
            .insert(column_id, json!({ "label": new_status }));
        item.updated_at = Utc::now();
        self.touch_board(board_id);
        self.item(item_id)
    }

    pub fn assign_user(&mut self, item_id: ItemId, user_id: UserId) -> BoardResult<&Item> {
        self.user(user_id)?;
        let board_id = self.item(item_id)?.board_id;
        let column_id = self.column_id(board_id, ColumnType::People)?;

        let item = self.item_mut(item_id)?;
        item.column_values.insert(
            column_id,
            json!({ "personsAndTeams": [{ "id": user_id, "kind": "person" }] }),
        );
        item.updated_at = Utc::now();
        self.touch_board(board_id);
        self.item(item_id)
    }

    pub fn add_update(&mut self, item_id: ItemId, body: &str) -> BoardResult<&ItemUpdate> {
        if body.trim().is_empty() {
            return Err(BoardError::InvalidInput(
                "update_text must not be empty".to_string(),
            ));
        }
        self.item(item_id)?;

        let id = self.next_update_id.max(1);
        self.next_update_id = id + 1;
        self.updates.push(ItemUpdate {
            id,
            item_id,
            body: body.to_string(),
            created_at: Utc::now(),
        });
        Ok(&self.updates[self.updates.len() - 1])
    }

    pub fn updates_for(&self, item_id: ItemId) -> Vec<&ItemUpdate> {
        self.updates.iter().filter(|u| u.item_id == item_id).collect()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &str) -> BoardResult<&Note> {
        self.notes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| BoardError::NoteNotFound(id.to_string()))
    }

    pub fn create_note(
        &mut self,
        title: &str,
        content: &str,
        tags: Vec<String>,
    ) -> BoardResult<&Note> {
        if title.trim().is_empty() {
            return Err(BoardError::InvalidInput("title must not be empty".to_string()));
        }

        let seq = self.next_note_id.max(1);
        self.next_note_id = seq + 1;
        let now = Utc::now();
        self.notes.push(Note {
            id: format!("note-{seq}"),
            title: title.to_string(),
            content: content.to_string(),
            tags,
            created_at: now,
            updated_at: now,
        });
        Ok(&self.notes[self.notes.len() - 1])
    }

    pub fn update_note(&mut self, id: &str, patch: NotePatch) -> BoardResult<&Note> {
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| BoardError::NoteNotFound(id.to_string()))?;

        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(content) = patch.content {
            note.content = content;
        }
        if let Some(tags) = patch.tags {
            note.tags = tags;
        }
        note.updated_at = Utc::now();
        self.note(id)
    }

    /// Notes matching `query` in title or content (case-insensitive) and
    /// carrying every tag in `tags`. Empty filters match everything.
    pub fn search_notes(&self, query: &str, tags: &[String]) -> Vec<NoteSummary> {
        let query = query.to_lowercase();
        self.notes
            .iter()
            .filter(|n| {
                query.is_empty()
                    || n.title.to_lowercase().contains(&query)
                    || n.content.to_lowercase().contains(&query)
            })
            .filter(|n| tags.iter().all(|t| n.tags.contains(t)))
            .map(|n| NoteSummary {
                id: n.id.clone(),
                title: n.title.clone(),
                preview: preview(&n.content),
                tags: n.tags.clone(),
                updated_at: n.updated_at,
            })
            .collect()
    }

    fn column_id(&self, board_id: BoardId, column_type: ColumnType) -> BoardResult<String> {
        self.board(board_id)?
            .column_of(column_type)
            .map(|c| c.id.clone())
            .ok_or(BoardError::MissingColumn {
                board_id,
                column_type,
            })
    }

    fn touch_board(&mut self, id: BoardId) {
        if let Some(board) = self.boards.iter_mut().find(|b| b.id == id) {
            board.updated_at = Utc::now();
        }
    }

    /// A small seeded workspace for demos and tests.
    pub fn sample() -> Self {
        let now = Utc::now();
        let mut ws = Self::new();

        ws.add_board(Board {
            id: 1,
            name: "Product Launch".to_string(),
            description: Some("Q3 launch checklist".to_string()),
            state: BoardState::Active,
            board_kind: "public".to_string(),
            columns: vec![
                Column {
                    id: "status".to_string(),
                    title: "Status".to_string(),
                    column_type: ColumnType::Status,
                },
                Column {
                    id: "person".to_string(),
                    title: "Owner".to_string(),
                    column_type: ColumnType::People,
                },
                Column {
                    id: "date".to_string(),
                    title: "Due".to_string(),
                    column_type: ColumnType::Date,
                },
            ],
            groups: vec![
                Group {
                    id: "topics".to_string(),
                    title: "Backlog".to_string(),
                    color: "#579bfc".to_string(),
                    position: 0,
                },
                Group {
                    id: "sprint".to_string(),
                    title: "Current Sprint".to_string(),
                    color: "#00c875".to_string(),
                    position: 1,
                },
            ],
            updated_at: now,
        });
        ws.add_board(Board {
            id: 2,
            name: "Team Notes".to_string(),
            description: None,
            state: BoardState::Active,
            board_kind: "private".to_string(),
            columns: vec![Column {
                id: "text".to_string(),
                title: "Summary".to_string(),
                column_type: ColumnType::Text,
            }],
            groups: vec![Group {
                id: "general".to_string(),
                title: "General".to_string(),
                color: "#c4c4c4".to_string(),
                position: 0,
            }],
            updated_at: now,
        });

        ws.add_user(User {
            id: 100,
            name: "Avery Quinn".to_string(),
            email: "avery@example.com".to_string(),
            title: Some("Engineering Lead".to_string()),
        });
        ws.add_user(User {
            id: 101,
            name: "Sam Okafor".to_string(),
            email: "sam@example.com".to_string(),
            title: None,
        });

        let seed = [
            ("Write launch plan", "Done", 100, "2025-05-01"),
            ("Implement MCP integration", "Working on it", 100, "2025-06-01"),
            ("Prepare release notes", "Stuck", 101, "2030-01-15"),
        ];
        for (name, status, owner, due) in seed {
            let mut column_values = BTreeMap::new();
            column_values.insert("status".to_string(), json!({ "label": status }));
            column_values.insert(
                "person".to_string(),
                json!({ "personsAndTeams": [{ "id": owner, "kind": "person" }] }),
            );
            column_values.insert("date".to_string(), json!(due));
            // Seed data is valid by construction.
            let _ = ws.create_item(NewItem {
                board_id: 1,
                item_name: name.to_string(),
                group_id: None,
                column_values,
            });
        }

        let _ = ws.create_note(
            "Welcome to MCP Notes",
            "This is your first note. You can create more using the create_note tool.",
            vec!["welcome".to_string(), "introduction".to_string()],
        );
        let _ = ws.create_note(
            "Shopping List",
            "- Milk\n- Eggs\n- Bread\n- Apples",
            vec!["shopping".to_string(), "groceries".to_string()],
        );

        ws
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let head: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}
