// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::io::Write;
use std::sync::Arc;

use super::*;
use crate::testutil::{open_issue, search_hit, FakeConnector, FakeJira, TEST_CONFIG};
use jg_wire::{Request, Response};
use yare::parameterized;

struct Harness {
    dispatcher: Dispatcher,
    fake: Arc<FakeJira>,
    // Keeps the config file alive for the dispatcher's lifetime.
    _config: tempfile::NamedTempFile,
}

fn harness() -> Harness {
    harness_with(FakeJira::default())
}

fn harness_with(fake: FakeJira) -> Harness {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TEST_CONFIG.as_bytes()).unwrap();
    let fake = Arc::new(fake);
    let dispatcher = Dispatcher::new(
        DispatcherOptions {
            config_path: file.path().to_path_buf(),
            batch_size: 3,
        },
        Box::new(FakeConnector(fake.clone())),
    );
    Harness {
        dispatcher,
        fake,
        _config: file,
    }
}

fn login_request() -> Request {
    Request::new("LOGIN")
        .with_attr("JIRA_URL", "https://jira.example.com")
        .with_attr("JIRA_USER", "syncer")
        .with_attr("JIRA_PASSWORD", "secret")
}

fn login(h: &mut Harness) {
    let response = h.dispatcher.handle(&login_request());
    assert_eq!(response, Response::string("9.4.0"));
}

fn error_message(response: &Response) -> String {
    match response {
        Response::Error { message, .. } => message.clone(),
        other => panic!("expected error response, got {:?}", other),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session-free operations
// ─────────────────────────────────────────────────────────────────────────────

#[parameterized(
    ping = { "PING", "PONG" },
    connect = { "CONNECT", "connected" },
    shutdown = { "SHUTDOWN", "CLOSING" },
    server_version = { "GET_SERVER_VERSION", "1.0" },
    referenced_fields = { "REFERENCED_FIELDS", "OK" },
)]
fn trivial_operations(tag: &str, value: &str) {
    let mut h = harness();
    assert_eq!(
        h.dispatcher.handle(&Request::new(tag)),
        Response::string(value)
    );
}

#[test]
fn unknown_tag_is_an_error() {
    let mut h = harness();
    let msg = error_message(&h.dispatcher.handle(&Request::new("MYSTERY")));
    assert_eq!(msg, "Unknown element name in request: MYSTERY");
}

#[test]
fn remote_operations_require_login() {
    let mut h = harness();
    let msg = error_message(&h.dispatcher.handle(&Request::new("LIST_PROJECTS")));
    assert_eq!(msg, "Not logged in");
}

// ─────────────────────────────────────────────────────────────────────────────
// LOGIN
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn login_returns_server_version() {
    let mut h = harness();
    login(&mut h);
    assert_eq!(h.dispatcher.server_version(), Some("9.4.0"));
}

#[test]
fn login_missing_attributes() {
    let mut h = harness();
    let msg = error_message(
        &h.dispatcher
            .handle(&Request::new("LOGIN").with_attr("JIRA_USER", "syncer")),
    );
    assert_eq!(msg, "Missing JIRA_URL in login");
}

#[test]
fn login_rejects_prehistoric_server() {
    let mut fake = FakeJira::default();
    fake.server.build_number = 400;
    let mut h = harness_with(fake);
    let msg = error_message(&h.dispatcher.handle(&login_request()));
    assert!(msg.contains("JIRA server version 5 or greater"));
}

#[test]
fn login_reports_config_failure() {
    let fake = Arc::new(FakeJira::default());
    let mut dispatcher = Dispatcher::new(
        DispatcherOptions {
            config_path: "/nonexistent/jigate.toml".into(),
            batch_size: 3,
        },
        Box::new(FakeConnector(fake)),
    );
    let msg = error_message(&dispatcher.handle(&login_request()));
    assert!(msg.contains("Error occurred while logging into the JIRA server"));
    assert!(msg.contains("failed to read config"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Projects
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn list_projects_returns_keys() {
    let mut h = harness();
    login(&mut h);
    assert_eq!(
        h.dispatcher.handle(&Request::new("LIST_PROJECTS")),
        Response::Strings(vec!["CORE".into(), "DOCS".into()])
    );
}

#[test]
fn get_project_echoes_known_project() {
    let mut h = harness();
    login(&mut h);
    let request = Request::new("GET_PROJECT").with_attr("PROJECT", "CORE");
    assert_eq!(h.dispatcher.handle(&request), Response::string("CORE"));
}

#[test]
fn get_project_all_is_passed_through() {
    let mut h = harness();
    login(&mut h);
    let request = Request::new("GET_PROJECT").with_attr("PROJECT", "*All*");
    assert_eq!(h.dispatcher.handle(&request), Response::string("*All*"));
}

#[test]
fn get_project_unknown_is_an_error() {
    let mut h = harness();
    login(&mut h);
    let request = Request::new("GET_PROJECT").with_attr("PROJECT", "NOPE");
    let msg = error_message(&h.dispatcher.handle(&request));
    assert_eq!(msg, "Unknown project requested: NOPE");
}

#[test]
fn get_server_date_formats_wire() {
    let mut h = harness();
    login(&mut h);
    assert_eq!(
        h.dispatcher.handle(&Request::new("GET_SERVER_DATE")),
        Response::string("2026/08/07 12:00:00")
    );
}

#[test]
fn get_server_date_without_server_time_is_an_error() {
    let mut fake = FakeJira::default();
    fake.server.server_time = None;
    let mut h = harness_with(fake);
    login(&mut h);
    let msg = error_message(&h.dispatcher.handle(&Request::new("GET_SERVER_DATE")));
    assert!(msg.contains("server time not included"));
}

// ─────────────────────────────────────────────────────────────────────────────
// LIST_FIELDS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn list_fields_descriptor_set() {
    let mut h = harness();
    login(&mut h);
    let request = Request::new("LIST_FIELDS").with_attr("PROJID", "CORE");
    let Response::Descs(descs) = h.dispatcher.handle(&request) else {
        panic!("expected DESCS response");
    };

    // Fixed system fields first, in protocol order.
    assert_eq!(descs[0].name, "Issue Key");
    assert_eq!(descs[0].access.code(), 4);
    assert_eq!(descs[0].field_type.as_str(), "WORD");
    assert_eq!(descs[16].name, "Fix");
    assert_eq!(descs[16].field_type.as_str(), "FIX");

    // Issue types come from the project, not the server-wide list.
    let issue_type = descs.iter().find(|d| d.name == "Issue Type").unwrap();
    assert_eq!(
        issue_type.values,
        Some(vec!["Bug".to_string(), "Task".to_string()])
    );

    // Status/Resolution combinations for resolution statuses only.
    let sr = descs.iter().find(|d| d.name == "Status/Resolution").unwrap();
    assert_eq!(
        sr.values,
        Some(vec![
            "Open".to_string(),
            "In Progress".to_string(),
            "Resolved/Fixed".to_string(),
            "Resolved/Won't Fix".to_string(),
        ])
    );

    // Declared custom select carries the sentinel plus its options.
    let wp = descs.iter().find(|d| d.name == "Work Progress").unwrap();
    assert_eq!(wp.field_type.as_str(), "SELECT");
    assert_eq!(
        wp.values,
        Some(vec!["<Empty>".to_string(), "Yes".to_string(), "No".to_string()])
    );

    // Undeclared remote custom fields default to read-only lines.
    let team = descs.iter().find(|d| d.name == "Team").unwrap();
    assert_eq!(team.field_type.as_str(), "LINE");
    assert_eq!(team.access.code(), 1);
    assert_eq!(team.values, None);

    // Non-custom remote fields get no custom descriptor (Summary already
    // appears once as a system field).
    assert_eq!(descs.iter().filter(|d| d.name == "Summary").count(), 1);
}

#[test]
fn list_fields_requires_projid() {
    let mut h = harness();
    login(&mut h);
    let msg = error_message(&h.dispatcher.handle(&Request::new("LIST_FIELDS")));
    assert_eq!(msg, "Missing PROJID in listFields");
}

// ─────────────────────────────────────────────────────────────────────────────
// SEGMENT_FILTERS + LIST_DEFECTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn list_defects_single_project() {
    let mut h = harness();
    login(&mut h);
    h.fake.push_search_page(vec![
        search_hit("CORE-1", "CORE"),
        search_hit("CORE-2", "CORE"),
    ]);
    let request = Request::new("LIST_DEFECTS")
        .with_attr("PROJID", "CORE")
        .with_attr("DATE", "2026/ 8/ 1 00:00: 0")
        .with_attr("MODDATE", "Updated")
        .with_attr("MAX", "50");
    assert_eq!(
        h.dispatcher.handle(&request),
        Response::Strings(vec!["CORE-1".into(), "CORE-2".into()])
    );
    let jqls = h.fake.search_jqls.lock().unwrap();
    assert_eq!(
        jqls[0],
        "project = \"CORE\" AND updated > \"2026/08/01 00:00\" ORDER BY key ASC"
    );
}

#[test]
fn list_defects_applies_translated_segment_filter() {
    let mut h = harness();
    login(&mut h);
    let seg = Request::new("SEGMENT_FILTERS")
        .with_attr("PROJID", "CORE")
        .with_attr("PROJECT_LIST", "*All*")
        .with_attr("SEGMENT_FILTER", "AND Work Progress='Yes'");
    assert_eq!(h.dispatcher.handle(&seg), Response::string("OK"));

    h.fake.push_search_page(vec![search_hit("CORE-1", "CORE")]);
    let request = Request::new("LIST_DEFECTS").with_attr("PROJID", "CORE");
    h.dispatcher.handle(&request);
    let jqls = h.fake.search_jqls.lock().unwrap();
    assert_eq!(
        jqls[0],
        "project = \"CORE\" AND \"Work Progress\"='Yes' ORDER BY key ASC"
    );
}

#[test]
fn list_defects_all_with_segment_checks_access() {
    let mut fake = FakeJira::default();
    fake.deny_projects = vec!["SECRET".to_string()];
    let mut h = harness_with(fake);
    login(&mut h);

    let seg = Request::new("SEGMENT_FILTERS")
        .with_attr("PROJID", "*All*")
        .with_attr("PROJECT_LIST", "CORE,SECRET");
    h.dispatcher.handle(&seg);

    h.fake.push_search_page(vec![search_hit("CORE-1", "CORE")]);
    let request = Request::new("LIST_DEFECTS").with_attr("PROJID", "*All*");
    assert_eq!(
        h.dispatcher.handle(&request),
        Response::Strings(vec!["CORE-1".into()])
    );
    // Only the accessible project was queried.
    let jqls = h.fake.search_jqls.lock().unwrap();
    assert_eq!(jqls.len(), 1);
    assert!(jqls[0].starts_with("project = \"CORE\""));
}

#[test]
fn list_defects_all_denied_everywhere_is_an_error() {
    let mut fake = FakeJira::default();
    fake.deny_projects = vec!["CORE".to_string(), "SECRET".to_string()];
    let mut h = harness_with(fake);
    login(&mut h);

    let seg = Request::new("SEGMENT_FILTERS")
        .with_attr("PROJID", "*All*")
        .with_attr("PROJECT_LIST", "CORE,SECRET");
    h.dispatcher.handle(&seg);

    let request = Request::new("LIST_DEFECTS").with_attr("PROJID", "*All*");
    let msg = error_message(&h.dispatcher.handle(&request));
    assert!(msg.contains("does not have access"));
}

#[test]
fn list_defects_all_unsegmented_queries_without_project_clause() {
    let mut h = harness();
    login(&mut h);
    h.fake.push_search_page(vec![
        search_hit("CORE-1", "CORE"),
        search_hit("DOCS-1", "DOCS"),
    ]);
    let request = Request::new("LIST_DEFECTS").with_attr("PROJID", "*All*");
    assert_eq!(
        h.dispatcher.handle(&request),
        Response::Strings(vec!["CORE-1".into(), "DOCS-1".into()])
    );
    let jqls = h.fake.search_jqls.lock().unwrap();
    assert_eq!(jqls[0], " ORDER BY key ASC");
}

#[test]
fn list_defects_filters_ignored_projects() {
    let mut h = harness();
    login(&mut h);
    h.fake.push_search_page(vec![
        search_hit("CORE-1", "CORE"),
        search_hit("SCRATCH-1", "SCRATCH"),
    ]);
    let request = Request::new("LIST_DEFECTS").with_attr("PROJID", "*All*");
    assert_eq!(
        h.dispatcher.handle(&request),
        Response::Strings(vec!["CORE-1".into()])
    );
}

#[test]
fn list_defects_rejects_status_resolution_segmentation() {
    let mut h = harness();
    login(&mut h);
    let seg = Request::new("SEGMENT_FILTERS")
        .with_attr("PROJID", "CORE")
        .with_attr("SEGMENT_FILTER", "AND (Status/Resolution='Open')");
    h.dispatcher.handle(&seg);

    let request = Request::new("LIST_DEFECTS").with_attr("PROJID", "CORE");
    let msg = error_message(&h.dispatcher.handle(&request));
    assert_eq!(msg, "Segmentation on Status/Resolution field is not supported");
}

#[test]
fn list_defects_invalid_date() {
    let mut h = harness();
    login(&mut h);
    let request = Request::new("LIST_DEFECTS")
        .with_attr("PROJID", "CORE")
        .with_attr("DATE", "last tuesday");
    assert_eq!(error_message(&h.dispatcher.handle(&request)), "Invalid date");
}

#[test]
fn list_defects_unknown_project() {
    let mut h = harness();
    login(&mut h);
    let request = Request::new("LIST_DEFECTS").with_attr("PROJID", "NOPE");
    assert_eq!(
        error_message(&h.dispatcher.handle(&request)),
        "Unknown project: NOPE"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// GET_DEFECT / NEW_DEFECT
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn get_defect_returns_fields_with_project() {
    let mut h = harness();
    login(&mut h);
    h.fake.insert_issue(open_issue("CORE-7"));
    let request = Request::new("GET_DEFECT")
        .with_attr("PROJID", "CORE")
        .with_attr("DEFECT", "CORE-7");
    let Response::Fields(fields) = h.dispatcher.handle(&request) else {
        panic!("expected FIELDS response");
    };
    assert!(fields.contains(&("Issue Key".to_string(), "CORE-7".to_string())));
    assert!(fields.contains(&("Status".to_string(), "Open".to_string())));
    // Configured selects report the sentinel even when unset.
    assert!(fields.contains(&("Work Progress".to_string(), "<Empty>".to_string())));
    assert_eq!(
        fields.last(),
        Some(&("*Project*".to_string(), "CORE".to_string()))
    );
}

#[test]
fn get_defect_missing_issue() {
    let mut h = harness();
    login(&mut h);
    let request = Request::new("GET_DEFECT")
        .with_attr("PROJID", "CORE")
        .with_attr("DEFECT", "CORE-404");
    assert_eq!(
        error_message(&h.dispatcher.handle(&request)),
        "Defect: CORE-404 not found"
    );
}

#[test]
fn new_defect_lists_default_fields() {
    let mut h = harness();
    login(&mut h);
    let request = Request::new("NEW_DEFECT").with_attr("PROJID", "CORE");
    let Response::Fields(fields) = h.dispatcher.handle(&request) else {
        panic!("expected FIELDS response");
    };
    let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
    assert!(names.contains(&"Summary"));
    assert!(names.contains(&"Work Progress"));
    assert_eq!(names.last(), Some(&"*Project*"));
}

#[test]
fn new_defect_rejects_all_projects() {
    let mut h = harness();
    login(&mut h);
    let request = Request::new("NEW_DEFECT").with_attr("PROJID", "*All*");
    assert_eq!(
        error_message(&h.dispatcher.handle(&request)),
        "Invalid PROJID in newDefect"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// CREATE_DEFECT
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn create_defect_creates_and_transitions() {
    let mut h = harness();
    login(&mut h);
    h.fake.insert_issue(open_issue("CORE-100"));

    let request = Request::new("CREATE_DEFECT")
        .with_field("PROJID", "CORE")
        .with_field("Summary", "imported")
        .with_field("Status", "Resolved")
        .with_field("Resolution", "Fixed")
        .with_field("Fix", "imported from the engine");
    assert_eq!(h.dispatcher.handle(&request), Response::string("CORE-100"));

    let created = h.fake.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(
        created[0].get("summary"),
        Some(&serde_json::json!("imported"))
    );

    // The new issue is Open but Resolved was requested: one transition,
    // carrying the resolution and the fix comment.
    let transitions = h.fake.transitions_done.lock().unwrap();
    assert_eq!(transitions.len(), 1);
    let (key, input) = &transitions[0];
    assert_eq!(key, "CORE-100");
    assert_eq!(input.id, "21");
    assert_eq!(
        input.fields,
        vec![(
            "resolution".to_string(),
            serde_json::json!({ "name": "Fixed" })
        )]
    );
    assert_eq!(input.comment.as_deref(), Some("imported from the engine"));
}

#[test]
fn create_defect_skips_transition_when_status_matches() {
    let mut h = harness();
    login(&mut h);
    h.fake.insert_issue(open_issue("CORE-100"));

    let request = Request::new("CREATE_DEFECT")
        .with_field("PROJID", "CORE")
        .with_field("Status", "Open");
    assert_eq!(h.dispatcher.handle(&request), Response::string("CORE-100"));
    assert!(h.fake.transitions_done.lock().unwrap().is_empty());
}

#[test]
fn create_defect_requires_projid_field() {
    let mut h = harness();
    login(&mut h);
    let msg = error_message(&h.dispatcher.handle(&Request::new("CREATE_DEFECT")));
    assert_eq!(msg, "Missing PROJID in createDefect");
}

// ─────────────────────────────────────────────────────────────────────────────
// SAVE_DEFECT
// ─────────────────────────────────────────────────────────────────────────────

fn save_request() -> Request {
    Request::new("SAVE_DEFECT")
        .with_field("PROJID", "CORE")
        .with_field("DEFECTID", "CORE-7")
}

#[test]
fn save_defect_with_status_change_transitions_then_updates() {
    let mut h = harness();
    login(&mut h);
    h.fake.insert_issue(open_issue("CORE-7"));

    let request = save_request()
        .with_field("Summary", "updated title")
        .with_field("Status", "Resolved")
        .with_field("Resolution", "Fixed")
        .with_field("Fix", "fixed in abc123");
    assert_eq!(h.dispatcher.handle(&request), Response::string("CORE-7"));

    let transitions = h.fake.transitions_done.lock().unwrap();
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].1.id, "21");
    assert_eq!(transitions[0].1.comment.as_deref(), Some("fixed in abc123"));

    // The comment traveled with the transition, not separately.
    assert!(h.fake.comments.lock().unwrap().is_empty());

    // Plain fields went through the full-issue update.
    let updates = h.fake.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(
        updates[0].1.get("summary"),
        Some(&serde_json::json!("updated title"))
    );
    // Status and resolution were consumed by the transition.
    assert_eq!(updates[0].1.get("status"), None);
    assert_eq!(updates[0].1.get("resolution"), None);
}

#[test]
fn save_defect_without_status_change_updates_only() {
    let mut h = harness();
    login(&mut h);
    h.fake.insert_issue(open_issue("CORE-7"));

    let request = save_request()
        .with_field("Summary", "updated title")
        .with_field("Status", "Open")
        .with_field("Fix", "note");
    assert_eq!(h.dispatcher.handle(&request), Response::string("CORE-7"));

    assert!(h.fake.transitions_done.lock().unwrap().is_empty());
    // Fix still lands, as a standalone comment.
    assert_eq!(
        h.fake.comments.lock().unwrap().as_slice(),
        &[("CORE-7".to_string(), "note".to_string())]
    );
    let updates = h.fake.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
}

#[test]
fn save_defect_unreachable_status_is_an_error() {
    let mut h = harness();
    login(&mut h);
    let mut issue = open_issue("CORE-7");
    issue.status = Some(crate::jira::NamedId::new("10002", "Resolved"));
    h.fake.insert_issue(issue);

    // No workflow transition moves Resolved to In Progress.
    let request = save_request().with_field("Status", "In Progress");
    let msg = error_message(&h.dispatcher.handle(&request));
    assert!(msg.contains("no transition defined"));
    assert!(msg.contains("issue key (CORE-7)"));
    assert!(h.fake.updates.lock().unwrap().is_empty());
}

#[test]
fn save_defect_requires_defectid_field() {
    let mut h = harness();
    login(&mut h);
    let request = Request::new("SAVE_DEFECT").with_field("PROJID", "CORE");
    assert_eq!(
        error_message(&h.dispatcher.handle(&request)),
        "Missing DEFECTID in saveDefect"
    );
}
