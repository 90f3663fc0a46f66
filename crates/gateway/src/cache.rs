// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session caches.
//!
//! Four memo tables bound redundant remote calls. They are owned by one
//! dispatcher instance — never process-wide — so sessions sharing a
//! process (as under test) do not share state. Each table has its own
//! mutex; contention is not a concern with one connection at a time.
//!
//! Policy per table:
//! - projects and users: lazy, never invalidated within a session
//!   (projects and users are assumed not renamed or deleted mid-session)
//! - all-projects: lazy, wholesale cleared every Nth access to absorb
//!   project creation over a long-running session
//! - project access: memoizes the probe outcome per project; any HTTP
//!   status below [`BAD_ACCESS_CODE`] counts as allowed

use std::collections::HashMap;
use std::sync::Mutex;

use crate::jira::{JiraError, JiraResult, ProjectInfo, User};

/// Probe outcomes at or above this code mean access was denied.
const BAD_ACCESS_CODE: u16 = 201;

#[derive(Debug, Default)]
struct AllProjects {
    keys: Vec<String>,
    accesses: u32,
}

/// Memo tables for one session.
pub struct SessionCaches {
    refresh_count: u32,
    projects: Mutex<HashMap<String, ProjectInfo>>,
    users: Mutex<HashMap<String, User>>,
    all_projects: Mutex<AllProjects>,
    project_access: Mutex<HashMap<String, u16>>,
}

impl SessionCaches {
    /// `refresh_count` is how many all-projects accesses pass between
    /// wholesale clears of that table.
    pub fn new(refresh_count: u32) -> Self {
        SessionCaches {
            refresh_count: refresh_count.max(1),
            projects: Mutex::new(HashMap::new()),
            users: Mutex::new(HashMap::new()),
            all_projects: Mutex::new(AllProjects::default()),
            project_access: Mutex::new(HashMap::new()),
        }
    }

    /// Project by key, fetching and memoizing on first access.
    pub fn project(
        &self,
        key: &str,
        fetch: impl FnOnce() -> JiraResult<ProjectInfo>,
    ) -> JiraResult<ProjectInfo> {
        let mut projects = lock(&self.projects)?;
        if let Some(project) = projects.get(key) {
            return Ok(project.clone());
        }
        let project = fetch()?;
        projects.insert(key.to_string(), project.clone());
        Ok(project)
    }

    /// User by name, fetching and memoizing on first access. A user the
    /// remote does not know is not cached, so a later lookup retries.
    pub fn user(
        &self,
        name: &str,
        fetch: impl FnOnce() -> JiraResult<Option<User>>,
    ) -> JiraResult<Option<User>> {
        let mut users = lock(&self.users)?;
        if let Some(user) = users.get(name) {
            return Ok(Some(user.clone()));
        }
        let user = fetch()?;
        if let Some(user) = &user {
            users.insert(name.to_string(), user.clone());
        }
        Ok(user)
    }

    /// All project keys, refreshed wholesale every Nth access.
    ///
    /// An empty project list is a remote error: the authenticated user
    /// can always see at least one project when permissions are correct.
    pub fn all_projects(
        &self,
        fetch: impl FnOnce() -> JiraResult<Vec<String>>,
    ) -> JiraResult<Vec<String>> {
        let mut state = lock(&self.all_projects)?;
        state.accesses += 1;
        if state.accesses >= self.refresh_count {
            state.accesses = 0;
            state.keys.clear();
        }
        if state.keys.is_empty() {
            let keys = fetch()?;
            if keys.is_empty() {
                return Err(JiraError::new(
                    "No projects found: check jira permissions for jira user.",
                ));
            }
            state.keys = keys;
        }
        Ok(state.keys.clone())
    }

    /// Whether the session user can access issues in the project.
    ///
    /// The probe result (allowed, or the denying HTTP status) is
    /// memoized for the session. A probe failure without an HTTP status
    /// counts as allowed.
    pub fn has_project_access(
        &self,
        key: &str,
        probe: impl FnOnce() -> JiraResult<()>,
    ) -> JiraResult<bool> {
        let mut access = lock(&self.project_access)?;
        if let Some(code) = access.get(key) {
            return Ok(*code < BAD_ACCESS_CODE);
        }
        let code = match probe() {
            Ok(()) => 0,
            Err(e) => {
                tracing::warn!(
                    "access probe for project {} failed ({}): not replicating unless allowed",
                    key,
                    e
                );
                e.status.unwrap_or(0)
            }
        };
        access.insert(key.to_string(), code);
        Ok(code < BAD_ACCESS_CODE)
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>) -> JiraResult<std::sync::MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| JiraError::new("cache lock poisoned"))
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
