// tests/execution_plan.rs

//! Execution planning: closure expansion, topological order, cycle handling.

use backstop::errors::BackstopError;
use backstop::graph::{DependencyMap, PlanOutcome, plan_execution};

fn map(specs: &[(&str, &[&str])]) -> DependencyMap {
    specs
        .iter()
        .map(|(name, deps)| {
            (
                name.to_string(),
                deps.iter().map(|d| d.to_string()).collect(),
            )
        })
        .collect()
}

fn ordered(outcome: PlanOutcome) -> Vec<String> {
    match outcome {
        PlanOutcome::Ordered(plan) => plan.jobs,
        PlanOutcome::Cycle { message, .. } => panic!("expected an ordered plan, got: {message}"),
    }
}

fn index_of(order: &[String], name: &str) -> usize {
    order
        .iter()
        .position(|j| j == name)
        .unwrap_or_else(|| panic!("job '{name}' missing from order {order:?}"))
}

#[test]
fn requesting_a_job_pulls_in_its_transitive_prerequisites() {
    let map = map(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);

    let order = ordered(plan_execution(&["c".to_string()], &map).unwrap());
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[test]
fn diamond_is_ordered_without_duplication() {
    let map = map(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);

    let order = ordered(plan_execution(&["d".to_string()], &map).unwrap());
    assert_eq!(order.len(), 4);
    assert_eq!(order.iter().filter(|j| *j == "a").count(), 1);
    assert!(index_of(&order, "a") < index_of(&order, "b"));
    assert!(index_of(&order, "a") < index_of(&order, "c"));
    assert!(index_of(&order, "b") < index_of(&order, "d"));
    assert!(index_of(&order, "c") < index_of(&order, "d"));
}

#[test]
fn unrequested_dependents_stay_out_of_the_plan() {
    let map = map(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);

    let order = ordered(plan_execution(&["b".to_string()], &map).unwrap());
    assert_eq!(order, vec!["a", "b"]);
}

#[test]
fn duplicate_requests_appear_once() {
    let map = map(&[("a", &[]), ("b", &["a"])]);

    let order = ordered(
        plan_execution(&["b".to_string(), "b".to_string(), "a".to_string()], &map).unwrap(),
    );
    assert_eq!(order, vec!["a", "b"]);
}

#[test]
fn plan_is_deterministic_for_a_given_request() {
    let map = map(&[
        ("a", &[]),
        ("b", &[]),
        ("c", &["a", "b"]),
        ("d", &["c"]),
        ("e", &["c"]),
    ]);
    let request = vec!["d".to_string(), "e".to_string()];

    let first = ordered(plan_execution(&request, &map).unwrap());
    let second = ordered(plan_execution(&request, &map).unwrap());
    assert_eq!(first, second);
}

#[test]
fn cycle_among_relevant_jobs_is_reported_not_thrown() {
    let map = map(&[("a", &["b"]), ("b", &["a"]), ("c", &[])]);

    match plan_execution(&["a".to_string()], &map).unwrap() {
        PlanOutcome::Cycle { unordered, message } => {
            assert!(unordered.contains(&"a".to_string()));
            assert!(unordered.contains(&"b".to_string()));
            assert!(message.contains("cycle"));
        }
        PlanOutcome::Ordered(plan) => panic!("cycle not detected, got order {:?}", plan.jobs),
    }
}

#[test]
fn cycle_outside_the_relevant_set_does_not_block_planning() {
    let map = map(&[("a", &[]), ("c", &["d"]), ("d", &["c"])]);

    let order = ordered(plan_execution(&["a".to_string()], &map).unwrap());
    assert_eq!(order, vec!["a"]);
}

#[test]
fn partial_cycle_reports_only_the_stuck_jobs() {
    // "a" is orderable; "b" and "c" deadlock each other.
    let map = map(&[("a", &[]), ("b", &["a", "c"]), ("c", &["b"])]);

    match plan_execution(&["b".to_string()], &map).unwrap() {
        PlanOutcome::Cycle { unordered, .. } => {
            assert_eq!(unordered, vec!["b".to_string(), "c".to_string()]);
        }
        PlanOutcome::Ordered(plan) => panic!("cycle not detected, got order {:?}", plan.jobs),
    }
}

#[test]
fn unknown_requested_job_is_a_malformed_input_error() {
    let map = map(&[("a", &[])]);

    let err = plan_execution(&["ghost".to_string()], &map).unwrap_err();
    assert!(matches!(err, BackstopError::JobNotFound(name) if name == "ghost"));
}

#[test]
fn empty_request_yields_an_empty_plan() {
    let map = map(&[("a", &[])]);

    let order = ordered(plan_execution(&[], &map).unwrap());
    assert!(order.is_empty());
}
