//! Category intake flows: definitions, answers, the walker that navigates them
//! and the editor that authors them.

pub mod answer;
pub mod contact;
pub mod editor;
pub mod error;
pub mod render;
pub mod types;
pub mod validate;
pub mod walker;

pub use answer::{Answer, AnswerSet};
pub use contact::ContactInfo;
pub use editor::{Direction, FlowEditor};
pub use error::FlowError;
pub use types::{ConditionalNext, Flow, Step, StepOption, StepType};
pub use walker::{
    Next, Submission, Walker, compute_next, compute_previous, current_step, is_step_valid,
    is_terminal, progress,
};
