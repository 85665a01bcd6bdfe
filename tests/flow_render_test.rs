//! Answer parsing, display values, editor previews and flow linting.

mod common;

use homeserve::fixtures::{cleaning_flow, paint_flow};
use homeserve::flow::render::{Control, control_for, display_value, extract_answer, preview};
use homeserve::flow::validate::{dead_ends, find_cycle, lint, unreachable_steps, validate_flow};
use homeserve::flow::{Answer, FlowError, StepType};
use common::*;

// ---------------------------------------------------------------------------
// Controls and answers
// ---------------------------------------------------------------------------

#[test]
fn test_control_per_step_type() {
    assert_eq!(control_for(StepType::Radio), Control::OptionList);
    assert_eq!(control_for(StepType::Checkbox), Control::OptionList);
    assert_eq!(control_for(StepType::Select), Control::Dropdown);
    assert_eq!(control_for(StepType::Text), Control::SingleLine);
    assert_eq!(control_for(StepType::Textarea), Control::MultiLine);
    assert_eq!(control_for(StepType::Address), Control::MultiLine);
    assert_eq!(control_for(StepType::Date), Control::DatePicker);
    assert_eq!(control_for(StepType::Time), Control::TimePicker);
}

#[test]
fn test_extract_choice_answer() {
    let flow = paint_flow(1);
    let step = flow.step("step-1").expect("step-1");

    assert_eq!(extract_answer(step, "opt-2").expect("valid"), Some(Answer::choice("opt-2")));
    assert_eq!(extract_answer(step, "  ").expect("blank"), None);
    assert!(matches!(extract_answer(step, "opt-4"), Err(FlowError::UnknownOption { .. })));
}

#[test]
fn test_extract_date_and_time_answers() {
    let flow = paint_flow(1);
    let date = flow.step("step-6").expect("date step");
    assert_eq!(
        extract_answer(date, "2026-03-14").expect("date"),
        Some(Answer::Date { value: "2026-03-14".to_string() })
    );
    assert!(matches!(extract_answer(date, "14/03/2026"), Err(FlowError::InvalidAnswer { .. })));

    let cleaning = cleaning_flow(2);
    let time = cleaning.step("step-2").expect("time step");
    assert_eq!(
        extract_answer(time, "9:05").expect("time"),
        Some(Answer::Time { value: "09:05".to_string() })
    );
    assert!(extract_answer(time, "25:00").is_err());
}

#[test]
fn test_extract_text_answer_is_trimmed() {
    let flow = paint_flow(1);
    let address = flow.step("step-8").expect("address");
    assert_eq!(
        extract_answer(address, "  12 Main St \n").expect("text"),
        Some(Answer::text("12 Main St"))
    );
}

#[test]
fn test_display_value_uses_option_label() {
    let flow = paint_flow(1);
    let step = flow.step("step-4").expect("step-4");
    assert_eq!(display_value(step, &Answer::choice("opt-14")), "Farrow & Ball");
    assert_eq!(display_value(step, &Answer::choice("opt-gone")), "opt-gone");
    assert_eq!(
        display_value(step, &Answer::MultiChoice { option_ids: vec!["opt-11".into(), "opt-15".into()] }),
        "Dulux, Jotun"
    );
    assert_eq!(display_value(step, &Answer::text("free text")), "free text");
}

#[test]
fn test_preview_lines() {
    let flow = paint_flow(1);
    assert_eq!(preview(flow.step("step-1").expect("s1")), "Interior painting, Exterior painting, Both");
    assert_eq!(preview(flow.step("step-2").expect("s2")), "50 m² or less, 51-100 m², 101-150 m²...");
    assert_eq!(preview(flow.step("step-6").expect("s6")), "Date picker");

    let bare = choice_step("x", 1, vec![]);
    assert_eq!(preview(&bare), "No options");
}

// ---------------------------------------------------------------------------
// Graph checks
// ---------------------------------------------------------------------------

#[test]
fn test_demo_flows_validate() {
    validate_flow(&paint_flow(1)).expect("paint flow");
    validate_flow(&cleaning_flow(1)).expect("cleaning flow");
    assert!(lint(&paint_flow(1)).is_empty());
}

#[test]
fn test_empty_flow_is_not_valid_but_has_no_notes() {
    let empty = flow_of(1, vec![]);
    assert_eq!(validate_flow(&empty), Err(FlowError::Empty));
    assert!(lint(&empty).is_empty());
}

#[test]
fn test_unreachable_step_noted() {
    let mut flow = linear_flow();
    flow.steps.push(input_step("orphan", 3, StepType::Text));

    assert_eq!(unreachable_steps(&flow), vec!["orphan".to_string()]);
    let notes = lint(&flow);
    assert!(notes.iter().any(|n| n.contains("'orphan' cannot be reached")), "{notes:?}");
}

#[test]
fn test_dead_end_noted_and_rejected() {
    let mut flow = branching_flow();
    flow.step_mut("step-3").expect("step-3").next_step = None;

    assert_eq!(dead_ends(&flow), vec!["step-3".to_string()]);
    assert!(matches!(validate_flow(&flow), Err(FlowError::Invalid(_))));
    assert!(lint(&flow).iter().any(|n| n.contains("without a branch")));
}

#[test]
fn test_optional_branching_step_without_default_noted_and_rejected() {
    let flow = optional_branch_flow();

    assert_eq!(dead_ends(&flow), vec!["s1".to_string()]);
    assert!(matches!(validate_flow(&flow), Err(FlowError::Invalid(_))));
    let notes = lint(&flow);
    assert!(notes.iter().any(|n| n.contains("'s1' is optional")), "{notes:?}");

    let mut required = flow.clone();
    required.step_mut("s1").expect("s1").required = true;
    assert!(dead_ends(&required).is_empty());
    assert!(validate_flow(&required).is_ok());
}

#[test]
fn test_cycle_detected() {
    let mut flow = linear_flow();
    flow.step_mut("S2").expect("S2").next_step = Some("S1".to_string());
    assert!(find_cycle(&flow).is_some());
    assert!(matches!(validate_flow(&flow), Err(FlowError::Cycle(_))));
    assert!(lint(&flow).iter().any(|n| n.contains("No step ends the questions")));
}

#[test]
fn test_dangling_reference_rejected() {
    let mut flow = linear_flow();
    flow.initial_step_id = "nowhere".to_string();
    let Err(FlowError::Invalid(errors)) = validate_flow(&flow) else {
        panic!("dangling initial step accepted");
    };
    assert_eq!(errors, vec!["Initial step 'nowhere' does not exist".to_string()]);
}
