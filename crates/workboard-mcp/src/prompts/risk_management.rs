use crate::registry::{CapabilityDescriptor, PromptField, PromptStep};

/// `identify_risks` is filled by the client from `overdue_items`.
pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::prompt(
        "risk_management",
        "Risk Management",
        vec![
            PromptStep::input(
                "select_project",
                "Select Project",
                vec![PromptField::required("board_id", "Board", "select")
                    .with_dynamic_options("boards")],
            ),
            PromptStep::display("identify_risks", "Identifying Tasks at Risk...", "delayed_tasks"),
            PromptStep::input(
                "escalate_risks",
                "Escalate Selected Risks",
                vec![
                    PromptField::required("risk_items", "Items at Risk", "multiselect")
                        .with_dynamic_options("delayed_tasks"),
                    PromptField::required("notify_users", "Notify", "multiselect")
                        .with_dynamic_options("users"),
                    PromptField::required("escalation_message", "Message", "textarea"),
                ],
            ),
        ],
    )
    .with_description("Identify and escalate tasks at risk")
}
