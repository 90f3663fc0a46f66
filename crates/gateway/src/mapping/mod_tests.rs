// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::error::TransitionFailure;
use crate::jira::NamedId;
use crate::testutil::{open_issue, test_config, FakeJira};
use jg_core::FieldMap;

fn fields_with_status(status: &str, resolution: Option<&str>) -> FieldMap {
    let mut map = FieldMap::new();
    map.insert_one(fields::FIELD_STATUS, status);
    if let Some(resolution) = resolution {
        map.insert_one(fields::FIELD_RESOLUTION, resolution);
    }
    map
}

// ─────────────────────────────────────────────────────────────────────────────
// Status/resolution difference
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn same_status_is_not_different() {
    let issue = open_issue("CORE-1");
    let map = fields_with_status("Open", None);
    assert!(!is_different_status_resolution(&issue, &map));
}

#[test]
fn same_status_case_insensitive() {
    let issue = open_issue("CORE-1");
    let map = fields_with_status("OPEN", None);
    assert!(!is_different_status_resolution(&issue, &map));
}

#[test]
fn different_status_is_different() {
    let issue = open_issue("CORE-1");
    let map = fields_with_status("Resolved", None);
    assert!(is_different_status_resolution(&issue, &map));
}

#[test]
fn resolution_pairs_with_status() {
    let mut issue = open_issue("CORE-1");
    issue.status = Some(NamedId::new("10002", "Resolved"));
    issue.resolution = Some(NamedId::new("6", "Fixed"));

    // Same pair: no change.
    let map = fields_with_status("Resolved", Some("Fixed"));
    assert!(!is_different_status_resolution(&issue, &map));

    // Same status, different resolution: change.
    let map = fields_with_status("Resolved", Some("Won't Fix"));
    assert!(is_different_status_resolution(&issue, &map));

    // Requested resolution omitted while current has one: change.
    let map = fields_with_status("Resolved", None);
    assert!(is_different_status_resolution(&issue, &map));
}

#[test]
fn no_requested_status_is_not_different() {
    let issue = open_issue("CORE-1");
    assert!(!is_different_status_resolution(&issue, &FieldMap::new()));
}

// ─────────────────────────────────────────────────────────────────────────────
// Transition lookup against the remote
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn resolves_configured_and_offered_transition() {
    let fake = FakeJira::default();
    let config = test_config();
    let issue = open_issue("CORE-1");
    let transition =
        transition_for_target_status(&fake, &config.workflows, &issue, "Resolved").unwrap();
    assert_eq!(transition.name, "Resolve Issue");
    assert_eq!(transition.id, "21");
}

#[test]
fn unconfigured_target_fails_before_remote_lookup() {
    let fake = FakeJira::default();
    let config = test_config();
    let mut issue = open_issue("CORE-1");
    issue.status = Some(NamedId::new("10002", "Resolved"));
    let err =
        transition_for_target_status(&fake, &config.workflows, &issue, "In Progress").unwrap_err();
    match err {
        GatewayError::NoTransition { kind, .. } => {
            assert_eq!(kind, TransitionFailure::NotConfigured);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn empty_remote_offer_fails() {
    let mut fake = FakeJira::default();
    fake.offered_transitions.clear();
    let config = test_config();
    let issue = open_issue("CORE-1");
    let err =
        transition_for_target_status(&fake, &config.workflows, &issue, "Resolved").unwrap_err();
    match err {
        GatewayError::NoTransition { kind, .. } => {
            assert_eq!(kind, TransitionFailure::NoneAvailable);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn mismatched_remote_offer_fails() {
    let mut fake = FakeJira::default();
    fake.offered_transitions = vec![crate::jira::TransitionOption {
        id: "99".into(),
        name: "Escalate".into(),
    }];
    let config = test_config();
    let issue = open_issue("CORE-1");
    let err =
        transition_for_target_status(&fake, &config.workflows, &issue, "Resolved").unwrap_err();
    match err {
        GatewayError::NoTransition {
            kind,
            issue_key,
            current_status,
            target_status,
        } => {
            assert_eq!(kind, TransitionFailure::NoMatch);
            assert_eq!(issue_key, "CORE-1");
            assert_eq!(current_status, "Open");
            assert_eq!(target_status, "Resolved");
        }
        other => panic!("unexpected error: {}", other),
    }
}
