//! Authoring operations over a flow held in memory. Every operation either
//! applies completely or leaves the flow untouched; callers persist the flow
//! after a successful call.

use super::error::FlowError;
use super::types::{ConditionalNext, Flow, Step, StepOption};
use super::validate::{find_cycle, reference_errors, step_errors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }
}

pub struct FlowEditor {
    flow: Flow,
}

impl FlowEditor {
    /// Take ownership of a flow; steps are renumbered 1..n in authoring order.
    pub fn new(mut flow: Flow) -> Self {
        flow.steps.sort_by_key(|s| s.order);
        renumber(&mut flow);
        FlowEditor { flow }
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn into_flow(self) -> Flow {
        self.flow
    }

    /// Fresh `step-N` id not used in the flow.
    pub fn next_step_id(&self) -> String {
        let n = max_suffix(self.flow.steps.iter().map(|s| s.id.as_str()), "step-");
        format!("step-{}", n.saturating_add(1))
    }

    /// Fresh `opt-N` id not used by any step of the flow.
    pub fn next_option_id(&self) -> String {
        let ids = self.flow.steps.iter().flat_map(|s| s.options.iter().map(|o| o.id.as_str()));
        format!("opt-{}", max_suffix(ids, "opt-").saturating_add(1))
    }

    /// Options for the given labels with fresh sequential ids. Blank labels are skipped.
    pub fn new_options<'a>(&self, labels: impl IntoIterator<Item = &'a str>) -> Vec<StepOption> {
        let ids = self.flow.steps.iter().flat_map(|s| s.options.iter().map(|o| o.id.as_str()));
        let start = max_suffix(ids, "opt-").saturating_add(1);
        labels
            .into_iter()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .enumerate()
            .map(|(i, label)| StepOption {
                id: format!("opt-{}", start.saturating_add(i as u64)),
                label: label.to_string(),
                value: option_value(label),
            })
            .collect()
    }

    /// Append a new step. The first step added becomes the initial step.
    pub fn add_step(&mut self, step: Step) -> Result<(), FlowError> {
        let mut step = normalize(step);
        if self.flow.contains(&step.id) {
            return Err(FlowError::Invalid(vec![format!("Step '{}' already exists", step.id)]));
        }
        check_step(&step)?;
        step.order = self.flow.steps.iter().map(|s| s.order).max().unwrap_or(0) + 1;

        let mut candidate = self.flow.clone();
        if candidate.steps.is_empty() {
            candidate.initial_step_id = step.id.clone();
        }
        candidate.steps.push(step);
        self.commit(candidate)
    }

    /// Replace an existing step's content. Its authoring position is kept.
    pub fn update_step(&mut self, step: Step) -> Result<(), FlowError> {
        let mut step = normalize(step);
        let existing = self
            .flow
            .step(&step.id)
            .ok_or_else(|| FlowError::UnknownStep(step.id.clone()))?;
        step.order = existing.order;
        check_step(&step)?;

        let mut candidate = self.flow.clone();
        if let Some(slot) = candidate.step_mut(&step.id) {
            *slot = step;
        }
        self.commit(candidate)
    }

    /// Delete a step and every edge that points at it.
    pub fn remove_step(&mut self, step_id: &str) -> Result<Step, FlowError> {
        let index = self
            .flow
            .steps
            .iter()
            .position(|s| s.id == step_id)
            .ok_or_else(|| FlowError::UnknownStep(step_id.to_string()))?;
        let removed = self.flow.steps.remove(index);

        for step in &mut self.flow.steps {
            if step.next_step.as_deref() == Some(step_id) {
                step.next_step = None;
            }
            step.conditional_next_step.retain(|c| c.next_step_id != step_id);
        }
        renumber(&mut self.flow);
        if self.flow.initial_step_id == step_id {
            self.flow.initial_step_id = self
                .flow
                .steps
                .first()
                .map(|s| s.id.clone())
                .unwrap_or_default();
        }
        Ok(removed)
    }

    /// Add an option to a choice step; returns the new option id.
    pub fn add_option(&mut self, step_id: &str, label: &str) -> Result<String, FlowError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(FlowError::Invalid(vec!["Option label is required".to_string()]));
        }
        let option_id = self.next_option_id();
        let step = self.step_mut(step_id)?;
        if !step.step_type.is_choice() {
            return Err(FlowError::Invalid(vec![
                "Only choice steps have options".to_string(),
            ]));
        }
        step.options.push(StepOption {
            id: option_id.clone(),
            label: label.to_string(),
            value: option_value(label),
        });
        Ok(option_id)
    }

    /// Delete an option together with every branch rule that refers to it.
    pub fn remove_option(&mut self, step_id: &str, option_id: &str) -> Result<(), FlowError> {
        let step = self.step_mut(step_id)?;
        if step.option(option_id).is_none() {
            return Err(FlowError::UnknownOption {
                step_id: step_id.to_string(),
                option_id: option_id.to_string(),
            });
        }
        if step.step_type.is_choice() && step.options.len() <= 2 {
            return Err(FlowError::Invalid(vec![
                "A choice step needs at least 2 options".to_string(),
            ]));
        }
        step.options.retain(|o| o.id != option_id);
        step.conditional_next_step.retain(|c| c.option_id != option_id);
        Ok(())
    }

    /// Swap the step with its neighbour in authoring order. Navigation edges are
    /// untouched. Returns false when the step is already at that end.
    pub fn reorder(&mut self, step_id: &str, direction: Direction) -> Result<bool, FlowError> {
        let index = self
            .flow
            .position(step_id)
            .ok_or_else(|| FlowError::UnknownStep(step_id.to_string()))?;
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.flow.steps.len() => index + 1,
            _ => return Ok(false),
        };

        let (a, b) = {
            let ordered = self.flow.authoring_order();
            (ordered[index].id.clone(), ordered[target].id.clone())
        };
        let order_a = self.flow.step(&a).map(|s| s.order).unwrap_or_default();
        let order_b = self.flow.step(&b).map(|s| s.order).unwrap_or_default();
        if let Some(s) = self.flow.step_mut(&a) {
            s.order = order_b;
        }
        if let Some(s) = self.flow.step_mut(&b) {
            s.order = order_a;
        }
        self.flow.steps.sort_by_key(|s| s.order);
        Ok(true)
    }

    /// Route `option_id` of `step_id` to `next_step_id`, replacing any rule for that option.
    pub fn set_conditional_next(
        &mut self,
        step_id: &str,
        option_id: &str,
        next_step_id: &str,
    ) -> Result<(), FlowError> {
        if !self.flow.contains(next_step_id) {
            return Err(FlowError::UnknownStep(next_step_id.to_string()));
        }
        let mut candidate = self.flow.clone();
        let step = candidate
            .step_mut(step_id)
            .ok_or_else(|| FlowError::UnknownStep(step_id.to_string()))?;
        if step.option(option_id).is_none() {
            return Err(FlowError::UnknownOption {
                step_id: step_id.to_string(),
                option_id: option_id.to_string(),
            });
        }
        match step.conditional_next_step.iter_mut().find(|c| c.option_id == option_id) {
            Some(rule) => rule.next_step_id = next_step_id.to_string(),
            None => step.conditional_next_step.push(ConditionalNext {
                option_id: option_id.to_string(),
                next_step_id: next_step_id.to_string(),
            }),
        }
        self.commit(candidate)
    }

    pub fn clear_conditional_next(&mut self, step_id: &str, option_id: &str) -> Result<(), FlowError> {
        let step = self.step_mut(step_id)?;
        step.conditional_next_step.retain(|c| c.option_id != option_id);
        Ok(())
    }

    pub fn set_initial_step(&mut self, step_id: &str) -> Result<(), FlowError> {
        if !self.flow.contains(step_id) {
            return Err(FlowError::UnknownStep(step_id.to_string()));
        }
        self.flow.initial_step_id = step_id.to_string();
        Ok(())
    }

    fn step_mut(&mut self, step_id: &str) -> Result<&mut Step, FlowError> {
        self.flow
            .step_mut(step_id)
            .ok_or_else(|| FlowError::UnknownStep(step_id.to_string()))
    }

    /// Accept `candidate` if its references resolve and it has no cycle.
    fn commit(&mut self, mut candidate: Flow) -> Result<(), FlowError> {
        let errors = reference_errors(&candidate);
        if !errors.is_empty() {
            return Err(FlowError::Invalid(errors));
        }
        if let Some(id) = find_cycle(&candidate) {
            return Err(FlowError::Cycle(id));
        }
        candidate.steps.sort_by_key(|s| s.order);
        self.flow = candidate;
        Ok(())
    }
}

fn check_step(step: &Step) -> Result<(), FlowError> {
    let errors = step_errors(step);
    if errors.is_empty() { Ok(()) } else { Err(FlowError::Invalid(errors)) }
}

/// Drop fields that do not apply to the step's type.
fn normalize(mut step: Step) -> Step {
    step.title = step.title.trim().to_string();
    step.question = step.question.trim().to_string();
    if !step.step_type.is_choice() {
        step.options.clear();
        step.conditional_next_step.clear();
    }
    step.placeholder = step
        .placeholder
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    if step.next_step.as_deref().is_some_and(|n| n.trim().is_empty()) {
        step.next_step = None;
    }
    step
}

fn renumber(flow: &mut Flow) {
    for (i, step) in flow.steps.iter_mut().enumerate() {
        step.order = i as i64 + 1;
    }
}

fn max_suffix<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> u64 {
    ids.filter_map(|id| id.strip_prefix(prefix)?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Option value derived from its label: lowercase, whitespace runs become `-`.
pub fn option_value(label: &str) -> String {
    label
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
