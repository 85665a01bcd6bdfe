use serde::{Deserialize, Serialize};

/// Input kind of a step. Decides the rendered control and how answers are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Radio,
    Checkbox,
    Text,
    Textarea,
    Select,
    Date,
    Time,
    Address,
}

impl StepType {
    pub const ALL: [StepType; 8] = [
        StepType::Radio,
        StepType::Checkbox,
        StepType::Select,
        StepType::Text,
        StepType::Textarea,
        StepType::Date,
        StepType::Time,
        StepType::Address,
    ];

    /// Radio, checkbox and select steps answer with one of their options.
    pub fn is_choice(self) -> bool {
        matches!(self, StepType::Radio | StepType::Checkbox | StepType::Select)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepType::Radio => "radio",
            StepType::Checkbox => "checkbox",
            StepType::Text => "text",
            StepType::Textarea => "textarea",
            StepType::Select => "select",
            StepType::Date => "date",
            StepType::Time => "time",
            StepType::Address => "address",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        StepType::ALL.into_iter().find(|t| t.as_str() == s.trim())
    }

    pub fn label(self) -> &'static str {
        match self {
            StepType::Radio => "Single choice",
            StepType::Checkbox => "Checkbox",
            StepType::Text => "Short text",
            StepType::Textarea => "Long text",
            StepType::Select => "Dropdown",
            StepType::Date => "Date",
            StepType::Time => "Time",
            StepType::Address => "Address",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOption {
    pub id: String,
    pub label: String,
    pub value: String,
}

/// Edge override: choosing `option_id` routes to `next_step_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalNext {
    pub option_id: String,
    pub next_step_id: String,
}

/// One question of a category flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub title: String,
    pub question: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<StepOption>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub next_step: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_next_step: Vec<ConditionalNext>,
    #[serde(default)]
    pub order: i64,
}

impl Step {
    /// A blank step with the given id, used by the editor's "new step" form.
    pub fn blank(id: impl Into<String>, order: i64) -> Self {
        Step {
            id: id.into(),
            title: String::new(),
            question: String::new(),
            step_type: StepType::Radio,
            options: Vec::new(),
            required: true,
            placeholder: None,
            next_step: None,
            conditional_next_step: Vec::new(),
            order,
        }
    }

    pub fn option(&self, option_id: &str) -> Option<&StepOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Target of the rule for `option_id`, if any.
    pub fn conditional_target(&self, option_id: &str) -> Option<&str> {
        self.conditional_next_step
            .iter()
            .find(|c| c.option_id == option_id)
            .map(|c| c.next_step_id.as_str())
    }

    /// Every step id this step can navigate to.
    pub fn successors(&self) -> impl Iterator<Item = &str> {
        self.next_step
            .as_deref()
            .into_iter()
            .chain(self.conditional_next_step.iter().map(|c| c.next_step_id.as_str()))
    }
}

/// Intake definition for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    pub id: i64,
    pub category_id: i64,
    pub initial_step_id: String,
    pub steps: Vec<Step>,
}

impl Flow {
    pub fn new(id: i64, category_id: i64) -> Self {
        Flow { id, category_id, initial_step_id: String::new(), steps: Vec::new() }
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.step(id).is_some()
    }

    /// Steps sorted by `order`; ties keep their position in `steps`.
    pub fn authoring_order(&self) -> Vec<&Step> {
        let mut ordered: Vec<&Step> = self.steps.iter().collect();
        ordered.sort_by_key(|s| s.order);
        ordered
    }

    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.authoring_order().iter().position(|s| s.id == step_id)
    }
}
