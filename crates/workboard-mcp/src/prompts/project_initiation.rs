use crate::registry::{CapabilityDescriptor, PromptField, PromptStep};

pub fn descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::prompt(
        "project_initiation",
        "Project Initiation",
        vec![
            PromptStep::input(
                "create_board",
                "Create a new project board",
                vec![
                    PromptField::required("board_name", "Project Name", "text"),
                    PromptField::required("template_id", "Template", "select").with_options(&[
                        ("Basic Project", "1"),
                        ("Scrum", "2"),
                        ("Kanban", "3"),
                    ]),
                ],
            ),
            PromptStep::input(
                "assign_team",
                "Assign Team Members",
                vec![PromptField::required("team_members", "Team Members", "multiselect")
                    .with_dynamic_options("users")],
            ),
            PromptStep::input(
                "setup_tasks",
                "Set Up Initial Tasks",
                vec![PromptField::required("tasks", "Tasks", "textarea")
                    .with_placeholder("Enter tasks (one per line)")],
            ),
        ],
    )
    .with_description("Start a new project with initial tasks and team assignments")
}
