use askama::Template;

use crate::flow::render::control_for;
use crate::flow::{AnswerSet, ContactInfo, Step, is_terminal};
use super::PageContext;

pub struct OptionView {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

/// A step as the wizard page renders it, with the current answer filled in.
pub struct StepView {
    pub id: String,
    pub title: String,
    pub question: String,
    pub control: String,
    pub options: Vec<OptionView>,
    pub value: String,
    pub placeholder: String,
    pub required: bool,
    pub is_terminal: bool,
}

impl StepView {
    pub fn new(step: &Step, answers: &AnswerSet) -> Self {
        let answer = answers.get(&step.id);
        StepView {
            id: step.id.clone(),
            title: step.title.clone(),
            question: step.question.clone(),
            control: control_for(step.step_type).as_str().to_string(),
            options: step
                .options
                .iter()
                .map(|o| OptionView {
                    id: o.id.clone(),
                    label: o.label.clone(),
                    selected: answer.is_some_and(|a| a.selects(&o.id)),
                })
                .collect(),
            value: answer.map(|a| a.raw()).unwrap_or_default(),
            placeholder: step.placeholder.clone().unwrap_or_default(),
            required: step.required,
            is_terminal: is_terminal(step),
        }
    }
}

/// The request wizard, used live and as the admin preview.
#[derive(Template)]
#[template(path = "wizard.html")]
pub struct WizardTemplate {
    pub ctx: PageContext,
    pub category_name: String,
    /// Prefix of the wizard's form actions, e.g. `/request/3`.
    pub base_url: String,
    pub preview: bool,
    pub step: StepView,
    pub progress: u32,
    pub step_position: usize,
    pub step_count: usize,
    pub can_go_back: bool,
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub contact: ContactInfo,
    pub submitting: bool,
}

#[derive(Template)]
#[template(path = "request_success.html")]
pub struct SuccessTemplate {
    pub ctx: PageContext,
    pub message: String,
    pub email_delivered: bool,
    pub chat_link: Option<String>,
    pub redirect_secs: u32,
}
