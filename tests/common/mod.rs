//! Shared fixtures for the integration tests.
//!
//! - `linear_flow()` - two steps, a radio question then the contact step
//! - `branching_flow()` - a step with one branch rule and a default successor
//! - `optional_branch_flow()` - an optional branching step with no default
//! - `memory_app_state()` - application state on the in-memory store

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use homeserve::app::AppState;
use homeserve::auth::rate_limit::RateLimiter;
use homeserve::config::AppConfig;
use homeserve::dispatch::{Dispatcher, EmailParams, EmailSender, SendError};
use homeserve::flow::{
    ConditionalNext, ContactInfo, Flow, Step, StepOption, StepType, Walker,
};
use homeserve::store::{CatalogStore, MemoryStore, UserStore};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const CONTACT_NAME: &str = "Jane Doe";
pub const CONTACT_EMAIL: &str = "jane@example.com";
pub const CONTACT_PHONE: &str = "+1 555 0100";
pub const INBOX: &str = "inbox@example.com";
pub const CHAT_PHONE: &str = "15550100";

// ============================================================================
// FLOW BUILDERS
// ============================================================================

pub fn option(id: &str, label: &str) -> StepOption {
    StepOption { id: id.to_string(), label: label.to_string(), value: label.to_lowercase() }
}

pub fn choice_step(id: &str, order: i64, options: Vec<StepOption>) -> Step {
    Step {
        title: format!("Title {id}"),
        question: format!("Question {id}?"),
        step_type: StepType::Radio,
        options,
        ..Step::blank(id, order)
    }
}

pub fn input_step(id: &str, order: i64, step_type: StepType) -> Step {
    Step {
        title: format!("Title {id}"),
        question: format!("Question {id}?"),
        step_type,
        ..Step::blank(id, order)
    }
}

pub fn flow_of(category_id: i64, steps: Vec<Step>) -> Flow {
    let initial_step_id = steps.first().map(|s| s.id.clone()).unwrap_or_default();
    Flow { id: 1, category_id, initial_step_id, steps }
}

/// `S1 radio(optA, optB) -> S2`, `S2 text` (terminal).
pub fn linear_flow() -> Flow {
    let mut s1 = choice_step("S1", 1, vec![option("optA", "Option A"), option("optB", "Option B")]);
    s1.next_step = Some("S2".to_string());
    let s2 = input_step("S2", 2, StepType::Text);
    flow_of(7, vec![s1, s2])
}

/// `step-3` branches to `step-4` on `opt-9` and defaults to `step-5`.
pub fn branching_flow() -> Flow {
    let mut s3 = choice_step("step-3", 1, vec![option("opt-9", "Yes"), option("opt-10", "No")]);
    s3.conditional_next_step = vec![ConditionalNext {
        option_id: "opt-9".to_string(),
        next_step_id: "step-4".to_string(),
    }];
    s3.next_step = Some("step-5".to_string());

    let mut s4 = input_step("step-4", 2, StepType::Text);
    s4.next_step = Some("step-5".to_string());
    let s5 = input_step("step-5", 3, StepType::Text);
    flow_of(8, vec![s3, s4, s5])
}

/// Optional `s1` routes both of its options to `s2` and has no default successor.
pub fn optional_branch_flow() -> Flow {
    let mut s1 = choice_step("s1", 1, vec![option("a", "A"), option("b", "B")]);
    s1.required = false;
    s1.conditional_next_step = ["a", "b"]
        .into_iter()
        .map(|o| ConditionalNext { option_id: o.to_string(), next_step_id: "s2".to_string() })
        .collect();
    let s2 = input_step("s2", 2, StepType::Text);
    flow_of(9, vec![s1, s2])
}

pub fn valid_contact() -> ContactInfo {
    ContactInfo::new(CONTACT_NAME, CONTACT_EMAIL, CONTACT_PHONE)
}

/// A walker for `linear_flow()` standing on the terminal step with valid contact details.
pub fn walker_at_terminal(flow: &Flow) -> Walker {
    let mut walker = Walker::start(flow).expect("start walker");
    walker.record_answer(Some(homeserve::flow::Answer::choice("optA")));
    walker.advance(flow).expect("advance to terminal");
    walker.contact = valid_contact();
    walker
}

// ============================================================================
// EMAIL SENDERS
// ============================================================================

/// Records every email instead of sending it; fails when `fail` is set.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<EmailParams>>,
    pub fail: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        RecordingSender { sent: Mutex::new(Vec::new()), fail: true }
    }

    pub fn count(&self) -> usize {
        self.sent.lock().expect("lock").len()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, params: &EmailParams) -> Result<(), SendError> {
        self.sent.lock().expect("lock").push(params.clone());
        if self.fail {
            Err(SendError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

/// State backed by a fresh in-memory store; emails go to `sender`.
pub fn memory_app_state(sender: Arc<dyn EmailSender>) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let catalog: Arc<dyn CatalogStore> = store.clone();
    let users: Arc<dyn UserStore> = store.clone();
    let state = AppState {
        catalog,
        users,
        config: AppConfig::default(),
        dispatcher: Dispatcher::new(sender, INBOX, CHAT_PHONE),
        limiter: RateLimiter::default(),
    };
    (state, store)
}
