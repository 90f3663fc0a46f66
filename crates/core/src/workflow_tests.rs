// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn classic_workflow() -> Workflow {
    Workflow {
        name: "classic".into(),
        steps: vec![
            Step {
                name: "Open".into(),
                linked_status: "Open".into(),
                transitions: vec![
                    Transition {
                        name: "Start Progress".into(),
                        destination_step: "In Progress".into(),
                    },
                    Transition {
                        name: "Resolve Issue".into(),
                        destination_step: "Resolved".into(),
                    },
                ],
            },
            Step {
                name: "In Progress".into(),
                linked_status: "In Progress".into(),
                transitions: vec![Transition {
                    name: "Resolve Issue".into(),
                    destination_step: "Resolved".into(),
                }],
            },
            Step {
                name: "Resolved".into(),
                linked_status: "Resolved".into(),
                transitions: vec![Transition {
                    name: "Reopen Issue".into(),
                    destination_step: "Open".into(),
                }],
            },
        ],
        resolution_transitions: vec![ResolutionTransition {
            name: "Resolve Issue".into(),
        }],
    }
}

#[test]
fn find_transition_direct() {
    let workflows = vec![classic_workflow()];
    let matcher = TransitionMatcher::new(&workflows);
    assert_eq!(
        matcher.find_transition("Open", "In Progress"),
        Some("Start Progress")
    );
    assert_eq!(
        matcher.find_transition("In Progress", "Resolved"),
        Some("Resolve Issue")
    );
}

#[test]
fn find_transition_case_insensitive() {
    let workflows = vec![classic_workflow()];
    let matcher = TransitionMatcher::new(&workflows);
    assert_eq!(
        matcher.find_transition("OPEN", "in progress"),
        Some("Start Progress")
    );
}

#[test]
fn find_transition_none_when_unreachable() {
    let workflows = vec![classic_workflow()];
    let matcher = TransitionMatcher::new(&workflows);
    // No step moves Resolved directly to In Progress.
    assert_eq!(matcher.find_transition("Resolved", "In Progress"), None);
}

#[test]
fn find_transition_symmetry_with_graph() {
    // A name is returned iff some step linked to `from` has a transition
    // whose destination step is linked to `to`.
    let workflows = vec![classic_workflow()];
    let matcher = TransitionMatcher::new(&workflows);
    for (from, to, expected) in [
        ("Open", "Resolved", true),
        ("Resolved", "Open", true),
        ("Open", "Open", false),
        ("Missing", "Open", false),
    ] {
        assert_eq!(matcher.find_transition(from, to).is_some(), expected);
    }
}

#[test]
fn destination_steps_resolve_across_workflows() {
    // The destination step lives in another workflow; it must still match.
    let mut first = classic_workflow();
    first.steps.retain(|s| s.name != "Resolved");
    let second = Workflow {
        name: "shared".into(),
        steps: vec![Step {
            name: "Resolved".into(),
            linked_status: "Resolved".into(),
            transitions: vec![],
        }],
        resolution_transitions: vec![],
    };
    let workflows = vec![first, second];
    let matcher = TransitionMatcher::new(&workflows);
    assert_eq!(
        matcher.find_transition("Open", "Resolved"),
        Some("Resolve Issue")
    );
}

#[test]
fn first_transition_in_scan_order_wins() {
    let mut workflow = classic_workflow();
    // Second transition out of Open that also reaches Resolved.
    workflow.steps[0].transitions.push(Transition {
        name: "Close Issue".into(),
        destination_step: "Resolved".into(),
    });
    let workflows = vec![workflow];
    let matcher = TransitionMatcher::new(&workflows);
    assert_eq!(
        matcher.matching_transitions("Open", "Resolved"),
        vec!["Resolve Issue", "Close Issue"]
    );
    assert_eq!(
        matcher.find_transition("Open", "Resolved"),
        Some("Resolve Issue")
    );
}

#[test]
fn resolution_statuses_follow_transitions() {
    let workflows = vec![classic_workflow()];
    let statuses = resolution_statuses(&workflows);
    assert_eq!(statuses, vec!["Resolved".to_string()]);
}

#[test]
fn resolution_statuses_empty_without_resolution_transitions() {
    let mut workflow = classic_workflow();
    workflow.resolution_transitions.clear();
    assert!(resolution_statuses(&[workflow]).is_empty());
}
