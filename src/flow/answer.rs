use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A respondent's answer to one step, shaped by the step's input type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Answer {
    Text { value: String },
    Choice { option_id: String },
    MultiChoice { option_ids: Vec<String> },
    Date { value: String },
    Time { value: String },
}

impl Answer {
    pub fn text(value: impl Into<String>) -> Self {
        Answer::Text { value: value.into() }
    }

    pub fn choice(option_id: impl Into<String>) -> Self {
        Answer::Choice { option_id: option_id.into() }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Text { value } | Answer::Date { value } | Answer::Time { value } => {
                value.trim().is_empty()
            }
            Answer::Choice { option_id } => option_id.is_empty(),
            Answer::MultiChoice { option_ids } => option_ids.is_empty(),
        }
    }

    /// Whether this answer picked `option_id`.
    pub fn selects(&self, option_id: &str) -> bool {
        match self {
            Answer::Choice { option_id: chosen } => chosen == option_id,
            Answer::MultiChoice { option_ids } => option_ids.iter().any(|o| o == option_id),
            _ => false,
        }
    }

    /// The raw form value this answer was parsed from.
    pub fn raw(&self) -> String {
        match self {
            Answer::Text { value } | Answer::Date { value } | Answer::Time { value } => {
                value.clone()
            }
            Answer::Choice { option_id } => option_id.clone(),
            Answer::MultiChoice { option_ids } => option_ids.join(","),
        }
    }
}

/// Answers collected during one wizard session, keyed by step id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, Answer>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, step_id: &str) -> Option<&Answer> {
        self.0.get(step_id)
    }

    pub fn set(&mut self, step_id: impl Into<String>, answer: Answer) {
        self.0.insert(step_id.into(), answer);
    }

    pub fn remove(&mut self, step_id: &str) -> Option<Answer> {
        self.0.remove(step_id)
    }

    /// True when the step has a non-empty answer.
    pub fn is_answered(&self, step_id: &str) -> bool {
        self.get(step_id).is_some_and(|a| !a.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Answer)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Answer)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (String, Answer)>>(iter: I) -> Self {
        AnswerSet(iter.into_iter().collect())
    }
}
