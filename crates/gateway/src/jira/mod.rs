// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The remote issue-tracker capability surface.
//!
//! The dispatcher only ever talks to [`JiraApi`]; the blocking HTTP
//! implementation lives in [`http`] and tests drive the gateway with
//! scripted implementations instead.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

pub mod http;

/// Error from a remote service call.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct JiraError {
    pub message: String,
    /// HTTP status, when the failure was an HTTP-level rejection.
    pub status: Option<u16>,
}

impl JiraError {
    pub fn new(message: impl Into<String>) -> Self {
        JiraError {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        JiraError {
            message: message.into(),
            status: Some(status),
        }
    }
}

/// A specialized Result type for remote calls.
pub type JiraResult<T> = std::result::Result<T, JiraError>;

/// A remote entity with an id and a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedId {
    pub id: String,
    pub name: String,
}

impl NamedId {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        NamedId {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Look up an entity id by display name (case-insensitive).
pub fn id_for_name<'a>(entries: &'a [NamedId], name: &str) -> Option<&'a NamedId> {
    entries
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(name.trim()))
}

/// A remote user. Which representation identifies the user towards the
/// engine depends on the deployment; see [`crate::users`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub name: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Remote server identity.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub version: String,
    pub build_number: u64,
    pub server_time: Option<NaiveDateTime>,
}

/// One issue field as the remote reports it, by display name.
#[derive(Debug, Clone)]
pub struct IssueField {
    pub id: String,
    pub name: String,
    pub value: serde_json::Value,
}

/// A remote issue, reduced to what the gateway consumes.
#[derive(Debug, Clone, Default)]
pub struct Issue {
    pub key: String,
    pub project_key: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub environment: Option<String>,
    pub reporter: Option<User>,
    pub assignee: Option<User>,
    pub comments: Vec<String>,
    pub affects_versions: Option<Vec<String>>,
    pub fix_versions: Option<Vec<String>>,
    pub components: Option<Vec<String>>,
    pub due_date: Option<NaiveDate>,
    pub updated: Option<NaiveDateTime>,
    pub issue_type: Option<NamedId>,
    pub priority: Option<NamedId>,
    pub status: Option<NamedId>,
    pub resolution: Option<NamedId>,
    /// All non-null issue fields, named. Custom field matching happens by
    /// display name against the configured field registry.
    pub fields: Vec<IssueField>,
}

impl Issue {
    /// Current status display name, or empty when the remote omits it.
    pub fn status_name(&self) -> &str {
        self.status.as_ref().map(|s| s.name.as_str()).unwrap_or("")
    }
}

/// An entry of the remote field registry.
#[derive(Debug, Clone)]
pub struct RemoteField {
    pub id: String,
    pub name: String,
    pub custom: bool,
}

/// A remote project with its available issue types.
#[derive(Debug, Clone)]
pub struct ProjectInfo {
    pub key: String,
    pub issue_types: Vec<NamedId>,
}

/// One page of a JQL search.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub total: u32,
    pub issues: Vec<Issue>,
}

/// Field inputs for creating or updating an issue. Values use the REST
/// conventions directly: plain strings, `{"id": ...}`, `{"name": ...}`,
/// `{"value": ...}` or arrays thereof.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueInput {
    fields: Vec<(String, serde_json::Value)>,
}

impl IssueInput {
    pub fn new() -> Self {
        IssueInput { fields: Vec::new() }
    }

    /// Set a field, replacing an earlier value for the same id.
    pub fn set(&mut self, id: impl Into<String>, value: serde_json::Value) {
        let id = id.into();
        if let Some(entry) = self.fields.iter_mut().find(|(i, _)| *i == id) {
            entry.1 = value;
        } else {
            self.fields.push((id, value));
        }
    }

    pub fn get(&self, id: &str) -> Option<&serde_json::Value> {
        self.fields.iter().find(|(i, _)| i == id).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.fields.iter().map(|(i, v)| (i.as_str(), v))
    }

    /// The `{"fields": {...}}` REST body.
    pub fn to_json(&self) -> serde_json::Value {
        let mut fields = serde_json::Map::new();
        for (id, value) in &self.fields {
            fields.insert(id.clone(), value.clone());
        }
        serde_json::json!({ "fields": fields })
    }
}

/// A transition the remote issue currently offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOption {
    pub id: String,
    pub name: String,
}

/// Input for performing a transition: optional extra fields (resolution)
/// and an optional comment, applied atomically with the transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionInput {
    pub id: String,
    pub fields: Vec<(String, serde_json::Value)>,
    pub comment: Option<String>,
}

/// Create metadata for one issue type of a project.
#[derive(Debug, Clone)]
pub struct CreateMetaIssueType {
    pub id: String,
    pub name: String,
    /// Allowed priority values for the priority field, in server order.
    pub priorities: Vec<NamedId>,
}

/// What the gateway needs from the remote issue tracker. Every call is
/// synchronous; the dispatcher blocks until remote completion (§ the
/// one-connection model). No call is retried here — the engine owns
/// retry policy.
pub trait JiraApi: Send {
    fn server_info(&self) -> JiraResult<ServerInfo>;

    /// One page of a JQL search. Heavyweight fields (description,
    /// comments) are excluded from listing searches.
    fn search(&self, jql: &str, max_results: u32, start_at: u32) -> JiraResult<SearchPage>;

    fn issue(&self, key: &str) -> JiraResult<Issue>;

    /// Create an issue; returns the new issue key.
    fn create_issue(&self, input: &IssueInput) -> JiraResult<String>;

    fn update_issue(&self, key: &str, input: &IssueInput) -> JiraResult<()>;

    /// Transitions currently available on the issue.
    fn transitions(&self, key: &str) -> JiraResult<Vec<TransitionOption>>;

    fn transition_issue(&self, key: &str, input: &TransitionInput) -> JiraResult<()>;

    fn add_comment(&self, key: &str, body: &str) -> JiraResult<()>;

    fn project(&self, key: &str) -> JiraResult<ProjectInfo>;

    /// Keys of every project visible to the authenticated user.
    fn all_projects(&self) -> JiraResult<Vec<String>>;

    fn issue_types(&self) -> JiraResult<Vec<NamedId>>;

    fn priorities(&self) -> JiraResult<Vec<NamedId>>;

    fn resolutions(&self) -> JiraResult<Vec<NamedId>>;

    fn statuses(&self) -> JiraResult<Vec<NamedId>>;

    /// The full remote field registry.
    fn fields(&self) -> JiraResult<Vec<RemoteField>>;

    /// Look up a user by name; `Ok(None)` when the user does not exist.
    fn user(&self, name: &str) -> JiraResult<Option<User>>;

    /// Create metadata for a project: its issue types with allowed
    /// priority values.
    fn create_meta(&self, project_key: &str) -> JiraResult<Vec<CreateMetaIssueType>>;
}
