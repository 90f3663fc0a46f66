// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Query translation: segment filters to JQL, and JQL search
//! composition.
//!
//! Segment filters arrive written against generic field names and
//! human-readable value names; JQL wants remote field ids and value ids.
//! Translation is a fixed sequence of literal substitutions — best
//! effort, not transactional: a substitution that does not apply simply
//! leaves its text alone.

use jg_core::{dates, fields};

use crate::error::{GatewayError, Result};
use crate::jira::NamedId;

/// Metadata tables the filter translation substitutes from.
pub struct FilterTables<'a> {
    /// Custom field display names known to the remote.
    pub custom_field_names: &'a [String],
    pub issue_types: &'a [NamedId],
    pub statuses: &'a [NamedId],
    pub resolutions: &'a [NamedId],
    pub priorities: &'a [NamedId],
}

/// Translate a segment filter to JQL.
///
/// Substitutions, in order:
/// 1. standard field names to remote ids (`Status=` -> `status=`)
/// 2. custom field names quoted and escaped, longest name first so a
///    field whose name prefixes another is never corrupted
/// 3. enumerated value names to ids (`issuetype='Bug'` -> `issuetype="1"`)
/// 4. the empty marker `='<Empty>'` to the JQL null test ` is EMPTY`
pub fn translate_filter(filter: &str, tables: &FilterTables<'_>) -> String {
    let mut jql = filter.to_string();

    for (name, id) in fields::STANDARD_FIELDS {
        jql = jql.replace(&format!("{}=", name), &format!("{}=", id));
    }

    let mut custom_names: Vec<&String> = tables.custom_field_names.iter().collect();
    custom_names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    for name in custom_names {
        jql = jql.replace(
            &format!("{}=", name),
            &format!("\"{}\"=", escape_field_name(name)),
        );
    }

    for (field, values) in [
        (fields::FIELD_ISSUETYPE, tables.issue_types),
        (fields::FIELD_STATUS, tables.statuses),
        (fields::FIELD_RESOLUTION, tables.resolutions),
        (fields::FIELD_PRIORITY, tables.priorities),
    ] {
        let Some(id) = fields::remote_field_id(field) else {
            continue;
        };
        for entry in values {
            jql = jql.replace(
                &format!("{}='{}'", id, entry.name),
                &format!("{}=\"{}\"", id, entry.id),
            );
        }
    }

    jql = jql.replace("='<Empty>'", " is EMPTY");
    jql.trim().to_string()
}

/// Escape a field name for quoting in JQL: backslashes are doubled and
/// double quotes escaped.
fn escape_field_name(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Composes the JQL for querying issues from the remote server.
#[derive(Debug, Default)]
pub struct JqlBuilder<'a> {
    proj_id: Option<&'a str>,
    projects: Option<&'a [String]>,
    date: Option<&'a str>,
    mod_date: Option<&'a str>,
    segment_filter: Option<&'a str>,
    order_by: Option<&'a str>,
}

impl<'a> JqlBuilder<'a> {
    pub fn new() -> Self {
        JqlBuilder::default()
    }

    /// Single-project equality clause. Takes precedence over
    /// [`JqlBuilder::projects`].
    pub fn proj_id(mut self, proj_id: &'a str) -> Self {
        self.proj_id = Some(proj_id);
        self
    }

    /// Project-membership clause. An empty list means no project clause.
    pub fn projects(mut self, projects: &'a [String]) -> Self {
        self.projects = Some(projects);
        self
    }

    /// Reference date for the modification clause.
    pub fn date(mut self, date: &'a str) -> Self {
        self.date = Some(date);
        self
    }

    /// Modification-date field name; combined with [`JqlBuilder::date`].
    pub fn mod_date(mut self, mod_date: &'a str) -> Self {
        self.mod_date = Some(mod_date);
        self
    }

    /// Already-translated segment filter, appended verbatim. It is
    /// expected to carry its own boolean glue or parenthesization.
    pub fn segment_filter(mut self, segment_filter: &'a str) -> Self {
        self.segment_filter = Some(segment_filter);
        self
    }

    /// Order-by clause, appended verbatim.
    pub fn order_by(mut self, order_by: &'a str) -> Self {
        self.order_by = Some(order_by);
        self
    }

    /// Build the JQL string.
    ///
    /// A malformed reference date is a caller bug and aborts composition
    /// rather than producing a silently wrong query.
    pub fn build(&self) -> Result<String> {
        let mut jql = String::new();

        if let Some(proj_id) = self.proj_id {
            jql.push_str("project = \"");
            jql.push_str(proj_id);
            jql.push('"');
        } else if let Some(projects) = self.projects {
            if !projects.is_empty() {
                jql.push_str("project in (");
                for (i, project) in projects.iter().enumerate() {
                    if i > 0 {
                        jql.push(',');
                    }
                    jql.push('"');
                    jql.push_str(project);
                    jql.push('"');
                }
                jql.push(')');
            }
        }

        if let (Some(mod_date), Some(date)) = (self.mod_date, self.date) {
            let parsed = dates::parse_jql(date)
                .map_err(|_| GatewayError::InvalidQueryDate(date.to_string()))?;
            if !jql.is_empty() {
                jql.push_str(" AND ");
            }
            jql.push_str(&mod_date.to_lowercase());
            jql.push_str(" > \"");
            jql.push_str(&dates::format_jql(parsed));
            jql.push('"');
        }

        if let Some(filter) = self.segment_filter {
            if !filter.trim().is_empty() {
                jql.push(' ');
                jql.push_str(filter);
            }
        }

        if let Some(order_by) = self.order_by {
            if !order_by.trim().is_empty() {
                jql.push(' ');
                jql.push_str(order_by);
            }
        }

        Ok(jql)
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
