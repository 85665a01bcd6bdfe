//! Walker tests: next-step resolution, branching, back navigation, progress,
//! step validity and the submission latch.

mod common;

use homeserve::fixtures::paint_flow;
use homeserve::flow::validate::{dead_ends, validate_flow};
use homeserve::flow::{
    Answer, AnswerSet, ContactInfo, FlowError, Next, Walker, compute_next, compute_previous,
    current_step, is_step_valid, is_terminal, progress,
};
use common::*;

fn answers(pairs: &[(&str, Answer)]) -> AnswerSet {
    pairs.iter().map(|(id, a)| (id.to_string(), a.clone())).collect()
}

// ---------------------------------------------------------------------------
// Pure step functions
// ---------------------------------------------------------------------------

#[test]
fn test_both_options_of_linear_step_reach_contact_step() {
    let flow = linear_flow();
    let s1 = current_step(&flow, "S1").expect("S1");

    for opt in ["optA", "optB"] {
        let set = answers(&[("S1", Answer::choice(opt))]);
        let next = compute_next(&flow, s1, &set).expect("next");
        assert_eq!(next, Next::Step("S2".to_string()));
    }

    let s2 = current_step(&flow, "S2").expect("S2");
    assert!(is_terminal(s2));
    assert_eq!(compute_next(&flow, s2, &AnswerSet::new()).expect("terminal"), Next::Submit);
}

#[test]
fn test_branch_rule_wins_over_default_next() {
    let flow = branching_flow();
    let step = current_step(&flow, "step-3").expect("step-3");

    let chosen = answers(&[("step-3", Answer::choice("opt-9"))]);
    assert_eq!(compute_next(&flow, step, &chosen).expect("next"), Next::Step("step-4".to_string()));

    let other = answers(&[("step-3", Answer::choice("opt-10"))]);
    assert_eq!(compute_next(&flow, step, &other).expect("next"), Next::Step("step-5".to_string()));
}

#[test]
fn test_unanswered_branching_step_uses_default_next() {
    let flow = branching_flow();
    let step = current_step(&flow, "step-3").expect("step-3");
    assert_eq!(
        compute_next(&flow, step, &AnswerSet::new()).expect("next"),
        Next::Step("step-5".to_string())
    );
}

#[test]
fn test_branching_step_without_default_is_dead_end_for_unrouted_answer() {
    let mut flow = branching_flow();
    flow.step_mut("step-3").expect("step-3").next_step = None;
    let step = current_step(&flow, "step-3").expect("step-3");

    assert!(!is_terminal(step));
    let other = answers(&[("step-3", Answer::choice("opt-10"))]);
    assert_eq!(
        compute_next(&flow, step, &other),
        Err(FlowError::DeadEnd("step-3".to_string()))
    );
}

#[test]
fn test_null_default_without_matching_rule_never_submits() {
    let mut flow = branching_flow();
    flow.step_mut("step-3").expect("step-3").next_step = None;

    let mut walker = Walker::start(&flow).expect("start");
    walker.record_answer(Some(Answer::choice("opt-10")));
    walker.contact = valid_contact();

    assert_eq!(walker.advance(&flow), Err(FlowError::DeadEnd("step-3".to_string())));
    assert_eq!(walker.current_step_id, "step-3");
    assert!(!walker.is_at_terminal(&flow));
    assert!(matches!(walker.begin_submit(&flow), Err(FlowError::NotReady)));
    assert!(matches!(validate_flow(&flow), Err(FlowError::Invalid(_))));
}

#[test]
fn test_optional_branching_step_left_blank() {
    let mut flow = optional_branch_flow();
    assert_eq!(dead_ends(&flow), vec!["s1".to_string()]);
    assert!(matches!(validate_flow(&flow), Err(FlowError::Invalid(_))));

    let mut walker = Walker::start(&flow).expect("start");
    walker.record_answer(None);
    assert_eq!(walker.advance(&flow), Err(FlowError::DeadEnd("s1".to_string())));

    flow.step_mut("s1").expect("s1").next_step = Some("s2".to_string());
    assert!(dead_ends(&flow).is_empty());
    assert!(validate_flow(&flow).is_ok());
    assert_eq!(walker.advance(&flow), Ok(Next::Step("s2".to_string())));
}

#[test]
fn test_next_pointing_at_missing_step_is_unknown_step() {
    let mut flow = linear_flow();
    flow.step_mut("S1").expect("S1").next_step = Some("S9".to_string());
    let step = current_step(&flow, "S1").expect("S1");
    assert_eq!(
        compute_next(&flow, step, &AnswerSet::new()),
        Err(FlowError::UnknownStep("S9".to_string()))
    );
}

#[test]
fn test_current_step_unknown_id() {
    let flow = linear_flow();
    assert_eq!(current_step(&flow, "nope"), Err(FlowError::UnknownStep("nope".to_string())));
}

#[test]
fn test_compute_next_does_not_mutate_inputs() {
    let flow = paint_flow(1);
    let before = flow.clone();
    let set = answers(&[("step-3", Answer::choice("opt-9"))]);
    let set_before = set.clone();
    let step = current_step(&flow, "step-3").expect("step-3");

    let first = compute_next(&flow, step, &set).expect("first");
    let second = compute_next(&flow, step, &set).expect("second");

    assert_eq!(first, second);
    assert_eq!(flow, before);
    assert_eq!(set, set_before);
}

#[test]
fn test_previous_follows_authoring_order() {
    let flow = paint_flow(1);
    assert_eq!(compute_previous(&flow, "step-1"), None);
    assert_eq!(compute_previous(&flow, "step-2").as_deref(), Some("step-1"));
    // step-5 is reached directly from step-3 on "No", but back lands on step-4.
    assert_eq!(compute_previous(&flow, "step-5").as_deref(), Some("step-4"));
    assert_eq!(compute_previous(&flow, "missing"), None);
}

#[test]
fn test_progress_by_position() {
    let flow = paint_flow(1);
    assert_eq!(progress(&flow, "step-1"), 11);
    assert_eq!(progress(&flow, "step-3"), 33);
    assert_eq!(progress(&flow, "step-9"), 100);
    assert_eq!(progress(&flow, "missing"), 0);

    let linear = linear_flow();
    assert_eq!(progress(&linear, "S1"), 50);
    assert_eq!(progress(&linear, "S2"), 100);
}

#[test]
fn test_progress_never_decreases_along_a_forward_path() {
    let flow = paint_flow(1);
    let path = ["step-1", "step-2", "step-3", "step-5", "step-6", "step-7", "step-8", "step-9"];
    let values: Vec<u32> = path.iter().map(|id| progress(&flow, id)).collect();
    assert!(values.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
}

#[test]
fn test_step_validity_rules() {
    let flow = paint_flow(1);
    let empty = AnswerSet::new();
    let no_contact = ContactInfo::default();

    let required = current_step(&flow, "step-1").expect("step-1");
    assert!(!is_step_valid(required, &empty, &no_contact));
    let answered = answers(&[("step-1", Answer::choice("opt-1"))]);
    assert!(is_step_valid(required, &answered, &no_contact));

    let optional = current_step(&flow, "step-7").expect("step-7");
    assert!(is_step_valid(optional, &empty, &no_contact));

    let blank = answers(&[("step-1", Answer::text("   "))]);
    assert!(!is_step_valid(required, &blank, &no_contact));
}

#[test]
fn test_terminal_step_requires_valid_contact() {
    let flow = linear_flow();
    let terminal = current_step(&flow, "S2").expect("S2");
    let empty = AnswerSet::new();

    let cases = [
        (ContactInfo::new("", CONTACT_EMAIL, CONTACT_PHONE), false),
        (ContactInfo::new(CONTACT_NAME, "not-an-email", CONTACT_PHONE), false),
        (ContactInfo::new(CONTACT_NAME, "a@b", CONTACT_PHONE), false),
        (ContactInfo::new(CONTACT_NAME, CONTACT_EMAIL, "  "), false),
        (valid_contact(), true),
    ];
    for (contact, expected) in cases {
        assert_eq!(is_step_valid(terminal, &empty, &contact), expected, "{contact:?}");
    }
}

// ---------------------------------------------------------------------------
// Walker session
// ---------------------------------------------------------------------------

#[test]
fn test_walker_starts_on_initial_step() {
    let flow = paint_flow(3);
    let walker = Walker::start(&flow).expect("start");
    assert_eq!(walker.category_id, 3);
    assert_eq!(walker.current_step_id, "step-1");
    assert!(walker.answers.is_empty());
    assert!(!walker.can_go_back(&flow));
}

#[test]
fn test_walker_refuses_empty_or_broken_flow() {
    let empty = flow_of(1, vec![]);
    assert_eq!(Walker::start(&empty), Err(FlowError::Empty));

    let mut broken = linear_flow();
    broken.initial_step_id = "gone".to_string();
    assert_eq!(Walker::start(&broken), Err(FlowError::UnknownStep("gone".to_string())));
}

#[test]
fn test_walker_will_not_advance_without_required_answer() {
    let flow = linear_flow();
    let mut walker = Walker::start(&flow).expect("start");

    let result = walker.advance(&flow);
    assert!(matches!(result, Err(FlowError::InvalidAnswer { .. })));
    assert_eq!(walker.current_step_id, "S1");
}

#[test]
fn test_walker_paint_flow_skips_brand_question() {
    let flow = paint_flow(1);
    let mut walker = Walker::start(&flow).expect("start");

    for (step, opt) in [("step-1", "opt-1"), ("step-2", "opt-5"), ("step-3", "opt-10")] {
        assert_eq!(walker.current_step_id, step);
        walker.record_answer(Some(Answer::choice(opt)));
        walker.advance(&flow).expect("advance");
    }
    assert_eq!(walker.current_step_id, "step-5");

    assert!(walker.back(&flow));
    assert_eq!(walker.current_step_id, "step-4");
}

#[test]
fn test_walker_clearing_answer() {
    let flow = linear_flow();
    let mut walker = Walker::start(&flow).expect("start");
    walker.record_answer(Some(Answer::choice("optB")));
    assert!(walker.is_valid(&flow));
    walker.record_answer(None);
    assert!(!walker.is_valid(&flow));
}

#[test]
fn test_advance_on_terminal_step_stays_put() {
    let flow = linear_flow();
    let mut walker = walker_at_terminal(&flow);
    assert_eq!(walker.advance(&flow).expect("submit"), Next::Submit);
    assert_eq!(walker.current_step_id, "S2");
}

#[test]
fn test_begin_submit_requires_valid_terminal_step() {
    let flow = linear_flow();

    let mut early = Walker::start(&flow).expect("start");
    early.contact = valid_contact();
    assert!(matches!(early.begin_submit(&flow), Err(FlowError::NotReady)));

    let mut no_contact = walker_at_terminal(&flow);
    no_contact.contact = ContactInfo::default();
    assert!(matches!(no_contact.begin_submit(&flow), Err(FlowError::NotReady)));
    assert!(!no_contact.submitting);
}

#[test]
fn test_submission_latch() {
    let flow = linear_flow();
    let mut walker = walker_at_terminal(&flow);

    let submission = walker.begin_submit(&flow).expect("begin");
    assert_eq!(submission.category_id(), flow.category_id);
    assert_eq!(submission.contact(), &valid_contact());
    assert!(submission.answers().get("S1").is_some_and(|a| a.selects("optA")));

    assert!(walker.submitting);
    assert!(!walker.can_close());
    assert!(!walker.can_go_back(&flow));
    assert!(!walker.back(&flow));
    assert!(matches!(walker.begin_submit(&flow), Err(FlowError::AlreadySubmitting)));

    walker.finish_submit();
    assert!(walker.submitted);
    assert!(walker.can_close());
}

#[test]
fn test_each_walker_gets_its_own_nonce() {
    let flow = linear_flow();
    let first = Walker::start(&flow).expect("start");
    let second = Walker::start(&flow).expect("start");
    assert_eq!(first.nonce.len(), 32);
    assert_ne!(first.nonce, second.nonce);

    let mut walker = walker_at_terminal(&flow);
    let submission = walker.begin_submit(&flow).expect("begin");
    assert_eq!(submission.nonce(), walker.nonce);
}

#[test]
fn test_walker_from_cookie_without_nonce_gets_one_on_submit() {
    let flow = linear_flow();
    let walker = walker_at_terminal(&flow);
    let mut json = serde_json::to_value(&walker).expect("serialize");
    json.as_object_mut().expect("object").remove("nonce");

    let mut restored: Walker = serde_json::from_value(json).expect("deserialize");
    assert!(restored.nonce.is_empty());
    let submission = restored.begin_submit(&flow).expect("begin");
    assert!(!submission.nonce().is_empty());
}

#[test]
fn test_abort_submit_releases_latch() {
    let flow = linear_flow();
    let mut walker = walker_at_terminal(&flow);
    walker.begin_submit(&flow).expect("begin");
    walker.abort_submit();
    assert!(walker.can_close());
    assert!(walker.begin_submit(&flow).is_ok());
}

#[test]
fn test_walker_survives_session_serialization() {
    let flow = paint_flow(1);
    let mut walker = Walker::start(&flow).expect("start");
    walker.record_answer(Some(Answer::choice("opt-2")));
    walker.advance(&flow).expect("advance");

    let json = serde_json::to_string(&walker).expect("serialize");
    let restored: Walker = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored, walker);
}
