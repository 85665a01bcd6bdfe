use crate::flow::render::display_value;
use crate::flow::{ContactInfo, Flow, StepType, Submission};

/// Email subject and body for one service request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    pub subject: String,
    pub message: String,
}

/// Summarise a submission: the category, every answered question with its
/// display value (authoring order), the address and a footer.
pub fn build_summary(submission: &Submission, flow: &Flow, category_name: &str) -> RequestSummary {
    let answers = submission.answers();
    let mut lines = vec![format!("Category: {category_name}"), String::new(), "Answers:".to_string()];

    for step in flow.authoring_order() {
        if let Some(answer) = answers.get(&step.id) {
            lines.push(format!("{}: {}", step.question, display_value(step, answer)));
        }
    }
    // Answers for steps removed from the flow since the wizard started.
    for (step_id, answer) in answers.iter().filter(|(id, _)| !flow.contains(id)) {
        lines.push(format!("{step_id}: {}", answer.raw()));
    }

    let address = flow
        .authoring_order()
        .into_iter()
        .filter(|s| s.step_type == StepType::Address)
        .find_map(|s| answers.get(&s.id))
        .map(|a| a.raw())
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| "Not specified".to_string());

    lines.push(String::new());
    lines.push(format!("Address: {address}"));
    lines.push(String::new());
    lines.push("This request was generated automatically.".to_string());

    RequestSummary {
        subject: format!("New service request: {category_name}"),
        message: lines.join("\n"),
    }
}

/// Prefilled text of the click-to-chat message.
pub fn chat_text(contact: &ContactInfo, category_name: &str) -> String {
    format!(
        "New service request - {} sent a request in the {} category. Phone: {}",
        contact.full_name, category_name, contact.phone
    )
}
