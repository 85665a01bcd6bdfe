use std::collections::{HashMap, HashSet};

use crate::auth::validate::validate_required;

use super::error::FlowError;
use super::types::{Flow, Step};

/// Authoring rules for a single step. Empty when the step can be saved.
pub fn step_errors(step: &Step) -> Vec<String> {
    let mut errors = vec![];
    errors.extend(validate_required(&step.title, "Title", 100));
    errors.extend(validate_required(&step.question, "Question", 500));

    if step.step_type.is_choice() {
        if step.options.len() < 2 {
            errors.push("Add at least 2 options".to_string());
        }
        if step.options.iter().any(|o| o.label.trim().is_empty()) {
            errors.push("Option labels cannot be empty".to_string());
        }
    } else if !step.conditional_next_step.is_empty() {
        errors.push("Only choice steps can branch on an answer".to_string());
    }

    for rule in &step.conditional_next_step {
        if step.option(&rule.option_id).is_none() {
            errors.push(format!("Branch rule refers to unknown option '{}'", rule.option_id));
        }
    }
    errors
}

/// Dangling step references: the initial step and every navigation edge.
pub fn reference_errors(flow: &Flow) -> Vec<String> {
    let mut errors = vec![];
    if !flow.steps.is_empty() && !flow.contains(&flow.initial_step_id) {
        errors.push(format!("Initial step '{}' does not exist", flow.initial_step_id));
    }
    for step in &flow.steps {
        for target in step.successors() {
            if !flow.contains(target) {
                errors.push(format!("Step '{}' points to missing step '{}'", step.id, target));
            }
        }
    }
    errors
}

/// Id of a step that lies on a navigation cycle, if the graph has one.
pub fn find_cycle(flow: &Flow) -> Option<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(flow: &'a Flow, id: &'a str, marks: &mut HashMap<&'a str, Mark>) -> Option<String> {
        match marks.get(id) {
            Some(Mark::Visiting) => return Some(id.to_string()),
            Some(Mark::Done) => return None,
            None => {}
        }
        marks.insert(id, Mark::Visiting);
        if let Some(step) = flow.step(id) {
            for next in step.successors() {
                if let Some(found) = visit(flow, next, marks) {
                    return Some(found);
                }
            }
        }
        marks.insert(id, Mark::Done);
        None
    }

    let mut marks = HashMap::new();
    flow.steps.iter().find_map(|s| visit(flow, &s.id, &mut marks))
}

/// Steps that cannot be reached from the initial step.
pub fn unreachable_steps(flow: &Flow) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack = vec![flow.initial_step_id.as_str()];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(step) = flow.step(id) {
            stack.extend(step.successors());
        }
    }
    flow.authoring_order()
        .into_iter()
        .filter(|s| !seen.contains(s.id.as_str()))
        .map(|s| s.id.clone())
        .collect()
}

/// Branching steps without a default successor that some answer leaves with no
/// route: an option without a rule, or no answer at all on an optional step.
pub fn dead_ends(flow: &Flow) -> Vec<String> {
    flow.steps
        .iter()
        .filter(|s| !s.conditional_next_step.is_empty() && s.next_step.is_none())
        .filter(|s| !s.required || has_uncovered_option(s))
        .map(|s| s.id.clone())
        .collect()
}

fn has_uncovered_option(step: &Step) -> bool {
    step.options.iter().any(|o| step.conditional_target(&o.id).is_none())
}

/// Non-blocking findings shown next to the editor.
pub fn lint(flow: &Flow) -> Vec<String> {
    let mut notes = vec![];
    if flow.steps.is_empty() {
        return notes;
    }
    for id in unreachable_steps(flow) {
        notes.push(format!("Step '{id}' cannot be reached from the first step"));
    }
    for id in dead_ends(flow) {
        match flow.step(&id) {
            Some(step) if !has_uncovered_option(step) => notes.push(format!(
                "Step '{id}' is optional but has no default next step for a skipped answer"
            )),
            _ => notes.push(format!(
                "Step '{id}' has options without a branch and no default next step"
            )),
        }
    }
    if !flow.steps.iter().any(super::walker::is_terminal) {
        notes.push("No step ends the questions; add a contact step without a next step".to_string());
    }
    notes
}

/// Full check: every reference resolves, no cycles, and every answer path
/// reaches a terminal step.
pub fn validate_flow(flow: &Flow) -> Result<(), FlowError> {
    if flow.steps.is_empty() {
        return Err(FlowError::Empty);
    }
    let errors = reference_errors(flow);
    if !errors.is_empty() {
        return Err(FlowError::Invalid(errors));
    }
    if let Some(id) = find_cycle(flow) {
        return Err(FlowError::Cycle(id));
    }
    let dead = dead_ends(flow);
    if !dead.is_empty() {
        return Err(FlowError::Invalid(
            dead.into_iter()
                .map(|id| format!("Step '{id}' has no route for some options"))
                .collect(),
        ));
    }
    Ok(())
}
