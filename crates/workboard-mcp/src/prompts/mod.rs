//! Guided multi-step prompts. These are static documents; clients run the
//! resulting tool and resource calls themselves.

pub mod project_initiation;
pub mod risk_management;
pub mod sprint_planning;

use crate::server::ServerBuilder;

pub fn register_all(builder: ServerBuilder) -> ServerBuilder {
    builder
        .prompt(project_initiation::descriptor())
        .prompt(sprint_planning::descriptor())
        .prompt(risk_management::descriptor())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StepType;

    #[test]
    fn test_every_field_is_required() {
        for descriptor in [
            project_initiation::descriptor(),
            sprint_planning::descriptor(),
            risk_management::descriptor(),
        ] {
            let steps = &descriptor.as_prompt().unwrap().steps;
            assert_eq!(steps.len(), 3, "{}", descriptor.id);
            for step in steps {
                if step.step_type == StepType::Input {
                    assert!(!step.fields.is_empty());
                }
                assert!(step.fields.iter().all(|f| f.required));
            }
        }
    }
}
