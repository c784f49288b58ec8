use crate::registry::{CapabilityDescriptor, PromptField, PromptStep};

pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::prompt(
        "sprint_planning",
        "Sprint Planning",
        vec![
            PromptStep::input(
                "select_board",
                "Select Project Board",
                vec![PromptField::required("board_id", "Board", "select")
                    .with_dynamic_options("boards")],
            ),
            PromptStep::input(
                "select_backlog_items",
                "Select Backlog Items for Sprint",
                vec![PromptField::required("backlog_items", "Backlog Items", "multiselect")
                    .with_dynamic_options("items_by_status")],
            ),
            PromptStep::input(
                "set_estimates",
                "Set Estimates and Priorities",
                vec![PromptField::required("due_date", "Sprint End Date", "date")],
            ),
        ],
    )
    .with_description("Move items from backlog to current sprint with estimates and priorities")
}
