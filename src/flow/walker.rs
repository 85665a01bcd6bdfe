//! Navigation over a [`Flow`]: the pure step functions shared by the public
//! wizard, the admin preview and the JSON API, plus the per-session [`Walker`].

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::answer::{Answer, AnswerSet};
use super::contact::ContactInfo;
use super::error::FlowError;
use super::types::{Flow, Step};

/// Where "continue" leads from a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Next {
    #[serde(rename = "stepId")]
    Step(String),
    Submit,
}

pub fn current_step<'f>(flow: &'f Flow, step_id: &str) -> Result<&'f Step, FlowError> {
    flow.step(step_id)
        .ok_or_else(|| FlowError::UnknownStep(step_id.to_string()))
}

/// A step with neither a default successor nor branch rules ends the questions.
pub fn is_terminal(step: &Step) -> bool {
    step.next_step.is_none() && step.conditional_next_step.is_empty()
}

/// Successor of `step` for the given answers. A matching branch rule wins over
/// the default successor; rules are tried in list order.
pub fn compute_next(flow: &Flow, step: &Step, answers: &AnswerSet) -> Result<Next, FlowError> {
    if !step.conditional_next_step.is_empty() {
        if let Some(answer) = answers.get(&step.id) {
            let matched = step
                .conditional_next_step
                .iter()
                .find(|rule| answer.selects(&rule.option_id));
            if let Some(rule) = matched {
                return resolve(flow, &rule.next_step_id);
            }
        }
    }

    match &step.next_step {
        Some(next) => resolve(flow, next),
        None if is_terminal(step) => Ok(Next::Submit),
        None => Err(FlowError::DeadEnd(step.id.clone())),
    }
}

fn resolve(flow: &Flow, step_id: &str) -> Result<Next, FlowError> {
    if flow.contains(step_id) {
        Ok(Next::Step(step_id.to_string()))
    } else {
        Err(FlowError::UnknownStep(step_id.to_string()))
    }
}

/// The step before `current_step_id` in authoring order. This is not the
/// reverse of the taken path: after a branch, "back" may land on a skipped step.
pub fn compute_previous(flow: &Flow, current_step_id: &str) -> Option<String> {
    let ordered = flow.authoring_order();
    let index = ordered.iter().position(|s| s.id == current_step_id)?;
    index.checked_sub(1).map(|i| ordered[i].id.clone())
}

/// Completion percentage by authoring position; 0 for an unknown step.
pub fn progress(flow: &Flow, current_step_id: &str) -> u32 {
    let total = flow.steps.len();
    match flow.position(current_step_id) {
        Some(index) if total > 0 => {
            (((index + 1) as f64 / total as f64) * 100.0).round() as u32
        }
        _ => 0,
    }
}

pub fn is_step_valid(step: &Step, answers: &AnswerSet, contact: &ContactInfo) -> bool {
    if is_terminal(step) {
        return contact.is_valid();
    }
    if !step.required {
        return true;
    }
    answers.is_answered(&step.id)
}

/// Answers and contact details handed from a validated wizard to the dispatcher.
/// Only [`Walker::begin_submit`] creates one.
#[derive(Debug, Clone)]
pub struct Submission {
    nonce: String,
    category_id: i64,
    answers: AnswerSet,
    contact: ContactInfo,
}

impl Submission {
    /// Identifies the wizard session the submission came from.
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn category_id(&self) -> i64 {
        self.category_id
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }
}

/// State of one wizard session. Serialized into the session cookie between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Walker {
    /// Random id of this wizard session; the dispatcher sends at most once per nonce.
    #[serde(default)]
    pub nonce: String,
    pub category_id: i64,
    pub current_step_id: String,
    #[serde(default)]
    pub answers: AnswerSet,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub submitting: bool,
    #[serde(default)]
    pub submitted: bool,
}

impl Walker {
    pub fn start(flow: &Flow) -> Result<Self, FlowError> {
        if flow.steps.is_empty() {
            return Err(FlowError::Empty);
        }
        current_step(flow, &flow.initial_step_id)?;
        Ok(Walker {
            nonce: new_nonce(),
            category_id: flow.category_id,
            current_step_id: flow.initial_step_id.clone(),
            answers: AnswerSet::new(),
            contact: ContactInfo::default(),
            submitting: false,
            submitted: false,
        })
    }

    pub fn current<'f>(&self, flow: &'f Flow) -> Result<&'f Step, FlowError> {
        current_step(flow, &self.current_step_id)
    }

    /// Store (or clear, with `None`) the answer for the current step.
    pub fn record_answer(&mut self, answer: Option<Answer>) {
        match answer {
            Some(a) => self.answers.set(self.current_step_id.clone(), a),
            None => {
                self.answers.remove(&self.current_step_id);
            }
        }
    }

    pub fn is_valid(&self, flow: &Flow) -> bool {
        self.current(flow)
            .map(|step| is_step_valid(step, &self.answers, &self.contact))
            .unwrap_or(false)
    }

    pub fn is_at_terminal(&self, flow: &Flow) -> bool {
        self.current(flow).map(is_terminal).unwrap_or(false)
    }

    /// Move past the current step. Refuses while the step is invalid; on the
    /// terminal step returns [`Next::Submit`] without moving.
    pub fn advance(&mut self, flow: &Flow) -> Result<Next, FlowError> {
        let step = self.current(flow)?;
        if !is_terminal(step) && !is_step_valid(step, &self.answers, &self.contact) {
            return Err(FlowError::InvalidAnswer {
                step_id: step.id.clone(),
                reason: "an answer is required".to_string(),
            });
        }
        let next = compute_next(flow, step, &self.answers)?;
        if let Next::Step(id) = &next {
            self.current_step_id = id.clone();
        }
        Ok(next)
    }

    /// Step back in authoring order. Returns false on the first step or while submitting.
    pub fn back(&mut self, flow: &Flow) -> bool {
        if self.submitting {
            return false;
        }
        match compute_previous(flow, &self.current_step_id) {
            Some(prev) => {
                self.current_step_id = prev;
                true
            }
            None => false,
        }
    }

    pub fn can_go_back(&self, flow: &Flow) -> bool {
        !self.submitting && compute_previous(flow, &self.current_step_id).is_some()
    }

    pub fn progress(&self, flow: &Flow) -> u32 {
        progress(flow, &self.current_step_id)
    }

    /// Latch the wizard for submission. Fails unless the current step is
    /// terminal with a valid contact form, or while another submission is pending.
    pub fn begin_submit(&mut self, flow: &Flow) -> Result<Submission, FlowError> {
        if self.submitting {
            return Err(FlowError::AlreadySubmitting);
        }
        let step = self.current(flow)?;
        if !is_terminal(step) || !is_step_valid(step, &self.answers, &self.contact) {
            return Err(FlowError::NotReady);
        }
        if self.nonce.is_empty() {
            self.nonce = new_nonce();
        }
        self.submitting = true;
        Ok(Submission {
            nonce: self.nonce.clone(),
            category_id: self.category_id,
            answers: self.answers.clone(),
            contact: self.contact.clone(),
        })
    }

    pub fn finish_submit(&mut self) {
        self.submitting = false;
        self.submitted = true;
    }

    /// Release the latch when the hand-off was refused so the respondent can retry.
    pub fn abort_submit(&mut self) {
        self.submitting = false;
    }

    /// The wizard may not be closed while a submission is in flight.
    pub fn can_close(&self) -> bool {
        !self.submitting
    }
}

fn new_nonce() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}
