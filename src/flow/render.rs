use chrono::{NaiveDate, NaiveTime};

use super::answer::Answer;
use super::error::FlowError;
use super::types::{Step, StepType};

/// Input control a step renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Option list; one option can be picked.
    OptionList,
    Dropdown,
    SingleLine,
    MultiLine,
    DatePicker,
    TimePicker,
}

impl Control {
    /// Template name of the control.
    pub fn as_str(self) -> &'static str {
        match self {
            Control::OptionList => "options",
            Control::Dropdown => "dropdown",
            Control::SingleLine => "line",
            Control::MultiLine => "multiline",
            Control::DatePicker => "date",
            Control::TimePicker => "time",
        }
    }
}

/// Checkbox steps render single-select, same as radio.
pub fn control_for(step_type: StepType) -> Control {
    match step_type {
        StepType::Radio | StepType::Checkbox => Control::OptionList,
        StepType::Select => Control::Dropdown,
        StepType::Text => Control::SingleLine,
        StepType::Textarea | StepType::Address => Control::MultiLine,
        StepType::Date => Control::DatePicker,
        StepType::Time => Control::TimePicker,
    }
}

/// Parse raw form input into an answer for `step`. Blank input yields `None`.
pub fn extract_answer(step: &Step, raw: &str) -> Result<Option<Answer>, FlowError> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let invalid = |reason: &str| FlowError::InvalidAnswer {
        step_id: step.id.clone(),
        reason: reason.to_string(),
    };

    let answer = match step.step_type {
        StepType::Radio | StepType::Checkbox | StepType::Select => {
            if step.option(value).is_none() {
                return Err(FlowError::UnknownOption {
                    step_id: step.id.clone(),
                    option_id: value.to_string(),
                });
            }
            Answer::choice(value)
        }
        StepType::Text | StepType::Textarea | StepType::Address => Answer::text(value),
        StepType::Date => {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| invalid("expected a date as YYYY-MM-DD"))?;
            Answer::Date { value: value.to_string() }
        }
        StepType::Time => {
            let time = NaiveTime::parse_from_str(value, "%H:%M")
                .map_err(|_| invalid("expected a time as HH:MM"))?;
            Answer::Time { value: time.format("%H:%M").to_string() }
        }
    };
    Ok(Some(answer))
}

/// Human-readable value of an answer: option labels for choices, the raw text otherwise.
pub fn display_value(step: &Step, answer: &Answer) -> String {
    let label = |id: &str| {
        step.option(id)
            .map(|o| o.label.clone())
            .unwrap_or_else(|| id.to_string())
    };
    match answer {
        Answer::Choice { option_id } => label(option_id),
        Answer::MultiChoice { option_ids } => {
            option_ids.iter().map(|id| label(id)).collect::<Vec<_>>().join(", ")
        }
        Answer::Text { value } | Answer::Date { value } | Answer::Time { value } => value.clone(),
    }
}

/// One-line summary of a step for the editor's step list.
pub fn preview(step: &Step) -> String {
    match step.step_type {
        StepType::Radio | StepType::Checkbox | StepType::Select => {
            if step.options.is_empty() {
                return "No options".to_string();
            }
            let shown: Vec<&str> = step.options.iter().take(3).map(|o| o.label.as_str()).collect();
            let more = if step.options.len() > 3 { "..." } else { "" };
            format!("{}{more}", shown.join(", "))
        }
        StepType::Text => "Short text input".to_string(),
        StepType::Textarea => "Long text input".to_string(),
        StepType::Date => "Date picker".to_string(),
        StepType::Time => "Time picker".to_string(),
        StepType::Address => "Address input".to_string(),
    }
}
