// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted [`JiraApi`] double shared by the unit tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use jg_core::Config;

use crate::jira::{
    CreateMetaIssueType, Issue, IssueInput, JiraApi, JiraError, JiraResult, NamedId, ProjectInfo,
    RemoteField, SearchPage, ServerInfo, TransitionInput, TransitionOption, User,
};

/// A gateway configuration most tests share: one select custom field
/// with options, one date and one line custom field, and a classic
/// Open -> Resolved workflow with a resolution transition.
pub const TEST_CONFIG: &str = r#"
[handling]
ignore_projects = ["SCRATCH"]

[[custom_field]]
name = "Work Progress"
type = "select"
access = "rw"
options = ["Yes", "No"]

[[custom_field]]
name = "Found Date"
type = "date"
access = "rw"

[[custom_field]]
name = "Found In"
type = "line"
access = "ro"

[[workflow]]
name = "classic"

[[workflow.step]]
name = "Open"
linked_status = "Open"

[[workflow.step.transition]]
name = "Start Progress"
destination_step = "In Progress"

[[workflow.step.transition]]
name = "Resolve Issue"
destination_step = "Resolved"

[[workflow.step]]
name = "In Progress"
linked_status = "In Progress"

[[workflow.step.transition]]
name = "Resolve Issue"
destination_step = "Resolved"

[[workflow.step]]
name = "Resolved"
linked_status = "Resolved"

[[workflow.step.transition]]
name = "Reopen Issue"
destination_step = "Open"

[[workflow.resolution_transition]]
name = "Resolve Issue"
"#;

pub fn test_config() -> Config {
    Config::parse(TEST_CONFIG).expect("test config parses")
}

/// Scripted remote. Every collection is plain data; mutating fields
/// before handing the fake to the code under test scripts the session.
pub struct FakeJira {
    pub server: ServerInfo,
    pub issues: Mutex<HashMap<String, Issue>>,
    pub projects: Vec<ProjectInfo>,
    pub all_project_keys: Vec<String>,
    pub issue_types: Vec<NamedId>,
    pub priorities: Vec<NamedId>,
    pub resolutions: Vec<NamedId>,
    pub statuses: Vec<NamedId>,
    pub remote_fields: Vec<RemoteField>,
    pub users: Vec<(String, User)>,
    pub offered_transitions: Vec<TransitionOption>,
    pub create_meta_types: Vec<CreateMetaIssueType>,
    pub create_key: String,
    /// Projects whose access probe is rejected with a 400.
    pub deny_projects: Vec<String>,

    pub search_pages: Mutex<VecDeque<SearchPage>>,
    pub search_calls: Mutex<u32>,
    pub search_jqls: Mutex<Vec<String>>,
    pub search_error: Mutex<Option<JiraError>>,
    pub all_projects_calls: Mutex<u32>,
    pub created: Mutex<Vec<IssueInput>>,
    pub updates: Mutex<Vec<(String, IssueInput)>>,
    pub transitions_done: Mutex<Vec<(String, TransitionInput)>>,
    pub comments: Mutex<Vec<(String, String)>>,
}

impl Default for FakeJira {
    fn default() -> Self {
        FakeJira {
            server: ServerInfo {
                version: "9.4.0".into(),
                build_number: 940000,
                server_time: jg_core::dates::parse_wire("2026/08/07 12:00:00").ok(),
            },
            issues: Mutex::new(HashMap::new()),
            projects: vec![ProjectInfo {
                key: "CORE".into(),
                issue_types: vec![NamedId::new("1", "Bug"), NamedId::new("2", "Task")],
            }],
            all_project_keys: vec!["CORE".into(), "DOCS".into()],
            issue_types: vec![NamedId::new("1", "Bug"), NamedId::new("2", "Task")],
            priorities: vec![NamedId::new("2", "High"), NamedId::new("3", "Medium")],
            resolutions: vec![NamedId::new("6", "Fixed"), NamedId::new("7", "Won't Fix")],
            statuses: vec![
                NamedId::new("10000", "Open"),
                NamedId::new("10001", "In Progress"),
                NamedId::new("10002", "Resolved"),
            ],
            remote_fields: vec![
                RemoteField {
                    id: "summary".into(),
                    name: "Summary".into(),
                    custom: false,
                },
                RemoteField {
                    id: "customfield_10001".into(),
                    name: "Work Progress".into(),
                    custom: true,
                },
                RemoteField {
                    id: "customfield_10002".into(),
                    name: "Found Date".into(),
                    custom: true,
                },
                RemoteField {
                    id: "customfield_10003".into(),
                    name: "Team".into(),
                    custom: true,
                },
            ],
            users: Vec::new(),
            offered_transitions: vec![
                TransitionOption {
                    id: "11".into(),
                    name: "Start Progress".into(),
                },
                TransitionOption {
                    id: "21".into(),
                    name: "Resolve Issue".into(),
                },
            ],
            create_meta_types: vec![CreateMetaIssueType {
                id: "1".into(),
                name: "Bug".into(),
                priorities: vec![NamedId::new("3", "Medium")],
            }],
            create_key: "CORE-100".into(),
            deny_projects: Vec::new(),
            search_pages: Mutex::new(VecDeque::new()),
            search_calls: Mutex::new(0),
            search_jqls: Mutex::new(Vec::new()),
            search_error: Mutex::new(None),
            all_projects_calls: Mutex::new(0),
            created: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            transitions_done: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
        }
    }
}

impl FakeJira {
    pub fn insert_issue(&self, issue: Issue) {
        self.issues.lock().unwrap().insert(issue.key.clone(), issue);
    }

    pub fn push_search_page(&self, issues: Vec<Issue>) {
        let total = issues.len() as u32;
        self.search_pages
            .lock()
            .unwrap()
            .push_back(SearchPage { total, issues });
    }
}

/// A minimal open issue in project CORE.
pub fn open_issue(key: &str) -> Issue {
    Issue {
        key: key.to_string(),
        project_key: "CORE".into(),
        summary: Some("a defect".into()),
        status: Some(NamedId::new("10000", "Open")),
        ..Issue::default()
    }
}

/// A search-result stub carrying only key and project.
pub fn search_hit(key: &str, project: &str) -> Issue {
    Issue {
        key: key.to_string(),
        project_key: project.to_string(),
        ..Issue::default()
    }
}

impl JiraApi for FakeJira {
    fn server_info(&self) -> JiraResult<ServerInfo> {
        Ok(self.server.clone())
    }

    fn search(&self, jql: &str, _max_results: u32, _start_at: u32) -> JiraResult<SearchPage> {
        // Access probes are recognizable by their sentinel date clause
        // and do not consume scripted pages.
        if jql.contains("updated < '2006/1/1'") {
            for denied in &self.deny_projects {
                if jql.contains(&format!("\"{}\"", denied)) {
                    return Err(JiraError::with_status("denied", 400));
                }
            }
            return Ok(SearchPage::default());
        }
        if let Some(err) = self.search_error.lock().unwrap().clone() {
            return Err(err);
        }
        *self.search_calls.lock().unwrap() += 1;
        self.search_jqls.lock().unwrap().push(jql.to_string());
        Ok(self
            .search_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    fn issue(&self, key: &str) -> JiraResult<Issue> {
        self.issues
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| JiraError::with_status(format!("issue {} not found", key), 404))
    }

    fn create_issue(&self, input: &IssueInput) -> JiraResult<String> {
        self.created.lock().unwrap().push(input.clone());
        Ok(self.create_key.clone())
    }

    fn update_issue(&self, key: &str, input: &IssueInput) -> JiraResult<()> {
        self.updates
            .lock()
            .unwrap()
            .push((key.to_string(), input.clone()));
        Ok(())
    }

    fn transitions(&self, _key: &str) -> JiraResult<Vec<TransitionOption>> {
        Ok(self.offered_transitions.clone())
    }

    fn transition_issue(&self, key: &str, input: &TransitionInput) -> JiraResult<()> {
        self.transitions_done
            .lock()
            .unwrap()
            .push((key.to_string(), input.clone()));
        Ok(())
    }

    fn add_comment(&self, key: &str, body: &str) -> JiraResult<()> {
        self.comments
            .lock()
            .unwrap()
            .push((key.to_string(), body.to_string()));
        Ok(())
    }

    fn project(&self, key: &str) -> JiraResult<ProjectInfo> {
        self.projects
            .iter()
            .find(|p| p.key == key)
            .cloned()
            .ok_or_else(|| JiraError::with_status(format!("project {} not found", key), 404))
    }

    fn all_projects(&self) -> JiraResult<Vec<String>> {
        *self.all_projects_calls.lock().unwrap() += 1;
        Ok(self.all_project_keys.clone())
    }

    fn issue_types(&self) -> JiraResult<Vec<NamedId>> {
        Ok(self.issue_types.clone())
    }

    fn priorities(&self) -> JiraResult<Vec<NamedId>> {
        Ok(self.priorities.clone())
    }

    fn resolutions(&self) -> JiraResult<Vec<NamedId>> {
        Ok(self.resolutions.clone())
    }

    fn statuses(&self) -> JiraResult<Vec<NamedId>> {
        Ok(self.statuses.clone())
    }

    fn fields(&self) -> JiraResult<Vec<RemoteField>> {
        Ok(self.remote_fields.clone())
    }

    fn user(&self, name: &str) -> JiraResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, u)| u.clone()))
    }

    fn create_meta(&self, _project_key: &str) -> JiraResult<Vec<CreateMetaIssueType>> {
        Ok(self.create_meta_types.clone())
    }
}

/// Shared handle so tests can keep inspecting the fake after handing it
/// to a dispatcher.
impl JiraApi for std::sync::Arc<FakeJira> {
    fn server_info(&self) -> JiraResult<ServerInfo> {
        (**self).server_info()
    }
    fn search(&self, jql: &str, max_results: u32, start_at: u32) -> JiraResult<SearchPage> {
        (**self).search(jql, max_results, start_at)
    }
    fn issue(&self, key: &str) -> JiraResult<Issue> {
        (**self).issue(key)
    }
    fn create_issue(&self, input: &IssueInput) -> JiraResult<String> {
        (**self).create_issue(input)
    }
    fn update_issue(&self, key: &str, input: &IssueInput) -> JiraResult<()> {
        (**self).update_issue(key, input)
    }
    fn transitions(&self, key: &str) -> JiraResult<Vec<TransitionOption>> {
        (**self).transitions(key)
    }
    fn transition_issue(&self, key: &str, input: &TransitionInput) -> JiraResult<()> {
        (**self).transition_issue(key, input)
    }
    fn add_comment(&self, key: &str, body: &str) -> JiraResult<()> {
        (**self).add_comment(key, body)
    }
    fn project(&self, key: &str) -> JiraResult<ProjectInfo> {
        (**self).project(key)
    }
    fn all_projects(&self) -> JiraResult<Vec<String>> {
        (**self).all_projects()
    }
    fn issue_types(&self) -> JiraResult<Vec<NamedId>> {
        (**self).issue_types()
    }
    fn priorities(&self) -> JiraResult<Vec<NamedId>> {
        (**self).priorities()
    }
    fn resolutions(&self) -> JiraResult<Vec<NamedId>> {
        (**self).resolutions()
    }
    fn statuses(&self) -> JiraResult<Vec<NamedId>> {
        (**self).statuses()
    }
    fn fields(&self) -> JiraResult<Vec<RemoteField>> {
        (**self).fields()
    }
    fn user(&self, name: &str) -> JiraResult<Option<User>> {
        (**self).user(name)
    }
    fn create_meta(&self, project_key: &str) -> JiraResult<Vec<CreateMetaIssueType>> {
        (**self).create_meta(project_key)
    }
}

/// Connector handing out clones of one shared fake.
pub struct FakeConnector(pub std::sync::Arc<FakeJira>);

impl crate::dispatch::Connector for FakeConnector {
    fn connect(
        &self,
        _url: &str,
        _username: &str,
        _password: &str,
        _config: &Config,
    ) -> JiraResult<Box<dyn JiraApi>> {
        Ok(Box::new(self.0.clone()))
    }
}
