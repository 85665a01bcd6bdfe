use std::fmt;

/// Failures raised while walking or editing a category flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// A step id that is not part of the flow.
    UnknownStep(String),
    /// An option id that is not part of the step.
    UnknownOption { step_id: String, option_id: String },
    /// A branching step with no default successor and no rule for the answer.
    DeadEnd(String),
    /// The answer does not fit the step's input type.
    InvalidAnswer { step_id: String, reason: String },
    /// Step or flow failed authoring validation.
    Invalid(Vec<String>),
    /// A save would introduce a navigation cycle through the given step.
    Cycle(String),
    /// The flow has no steps.
    Empty,
    /// A submission is already in flight for this wizard.
    AlreadySubmitting,
    /// This wizard's request has already been sent.
    AlreadySubmitted,
    /// Submission attempted away from the terminal step or with an invalid contact form.
    NotReady,
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::UnknownStep(id) => write!(f, "Unknown step '{id}'"),
            FlowError::UnknownOption { step_id, option_id } => {
                write!(f, "Unknown option '{option_id}' on step '{step_id}'")
            }
            FlowError::DeadEnd(id) => {
                write!(f, "Step '{id}' has no route for the given answer")
            }
            FlowError::InvalidAnswer { step_id, reason } => {
                write!(f, "Invalid answer for step '{step_id}': {reason}")
            }
            FlowError::Invalid(errors) => write!(f, "{}", errors.join("; ")),
            FlowError::Cycle(id) => write!(f, "Navigation cycle through step '{id}'"),
            FlowError::Empty => write!(f, "Flow has no steps"),
            FlowError::AlreadySubmitting => write!(f, "A submission is already in progress"),
            FlowError::AlreadySubmitted => write!(f, "This request has already been sent"),
            FlowError::NotReady => write!(f, "The request is not ready to be submitted"),
        }
    }
}

impl std::error::Error for FlowError {}
