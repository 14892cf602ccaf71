//! Post-parse validation of search chains
//!
//! Chain shape depends on the whole step sequence, so it is checked here
//! rather than while building individual steps.

use crate::error::{GraphError, GraphResult};
use crate::query::ast::{GraphInstruction, SelectStep};
use std::mem::discriminant;

pub fn validate(instructions: &[GraphInstruction]) -> GraphResult<()> {
    for (position, instruction) in instructions.iter().enumerate() {
        let Some(steps) = instruction.steps() else {
            continue;
        };
        let allow_return = matches!(instruction, GraphInstruction::Select { .. });
        validate_steps(steps, allow_return).map_err(|message| {
            GraphError::bad_request(format!(
                "statement {} ({}): {}",
                position + 1,
                instruction.name(),
                message
            ))
        })?;
    }
    Ok(())
}

/// Searches alternate between nodes and edges; joins sit between searches;
/// `return` comes last
pub fn validate_steps(steps: &[SelectStep], allow_return: bool) -> Result<(), String> {
    match steps.first() {
        Some(step) if step.is_search() => {}
        Some(step) => return Err(format!("chain must start with a search, found {}", step.describe())),
        None => return Err("empty search chain".to_string()),
    }

    let mut previous_search: Option<&SelectStep> = None;
    for (i, step) in steps.iter().enumerate() {
        match step {
            SelectStep::Node(_) | SelectStep::Edge(_) => {
                if let Some(previous) = previous_search {
                    if discriminant(previous) == discriminant(step) {
                        return Err(format!("two {} steps in succession at step {}", step.describe(), i + 1));
                    }
                }
                previous_search = Some(step);
            }
            SelectStep::Join(_) => {
                let before = i.checked_sub(1).and_then(|b| steps.get(b));
                let after = steps.get(i + 1);
                if !before.is_some_and(SelectStep::is_search) || !after.is_some_and(SelectStep::is_search) {
                    return Err(format!("{} at step {} must sit between two searches", step.describe(), i + 1));
                }
            }
            SelectStep::ReturnNames(names) => {
                if !allow_return {
                    return Err("return is only valid in select".to_string());
                }
                if i + 1 != steps.len() {
                    return Err("return must be the last step".to_string());
                }
                if names.is_empty() {
                    return Err("return needs at least one name".to_string());
                }
            }
        }
    }
    Ok(())
}
