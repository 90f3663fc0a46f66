// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound mapping: remote issue -> defect record.

use chrono::NaiveTime;

use jg_core::fields::{
    COMMENT_SEPARATOR, FIELD_AFFECTSVERSIONS, FIELD_ASSIGNEE, FIELD_COMMENTS, FIELD_COMPONENTS,
    FIELD_DESCRIPTION, FIELD_DUEDATE, FIELD_ENVIRONMENT, FIELD_FIXVERSIONS, FIELD_ISSUETYPE,
    FIELD_KEY, FIELD_PRIORITY, FIELD_REPORTER, FIELD_RESOLUTION, FIELD_STATUS, FIELD_SUMMARY,
    FIELD_UPDATED, CUSTOM_FIELD_ID_PREFIX, EMPTY_SELECT_OPTION, MULTI_VALUE_SEPARATOR,
};
use jg_core::{dates, Config, FieldMap, FieldType};

use crate::jira::{Issue, RemoteField};
use crate::users;

/// Build the engine-facing field map for an issue: every standard field
/// the issue carries, then the configured custom fields.
pub fn defect_fields(issue: &Issue, config: &Config) -> FieldMap {
    let mut map = FieldMap::new();

    if !issue.key.is_empty() {
        map.insert_one(FIELD_KEY, issue.key.clone());
    }
    if let Some(reporter) = &issue.reporter {
        if let Some(value) = users::user_value(reporter, config.user_styles()) {
            map.insert_one(FIELD_REPORTER, value);
        }
    }
    if let Some(assignee) = &issue.assignee {
        if let Some(value) = users::user_value(assignee, config.user_styles()) {
            map.insert_one(FIELD_ASSIGNEE, value);
        }
    }
    if let Some(summary) = &issue.summary {
        map.insert_one(FIELD_SUMMARY, summary.clone());
    }
    if let Some(description) = &issue.description {
        map.insert_one(FIELD_DESCRIPTION, description.clone());
    }
    if let Some(environment) = &issue.environment {
        map.insert_one(FIELD_ENVIRONMENT, environment.clone());
    }
    map.insert_one(FIELD_COMMENTS, issue.comments.join(COMMENT_SEPARATOR));
    if let Some(versions) = &issue.affects_versions {
        map.insert_one(FIELD_AFFECTSVERSIONS, versions.join(MULTI_VALUE_SEPARATOR));
    }
    if let Some(versions) = &issue.fix_versions {
        map.insert_one(FIELD_FIXVERSIONS, versions.join(MULTI_VALUE_SEPARATOR));
    }
    if let Some(components) = &issue.components {
        map.insert_one(FIELD_COMPONENTS, components.join(MULTI_VALUE_SEPARATOR));
    }
    if let Some(due) = issue.due_date {
        map.insert_one(
            FIELD_DUEDATE,
            dates::format_wire(due.and_time(NaiveTime::default())),
        );
    }
    if let Some(updated) = issue.updated {
        map.insert_one(FIELD_UPDATED, dates::format_wire(updated));
    }
    if let Some(issue_type) = &issue.issue_type {
        map.insert_one(FIELD_ISSUETYPE, issue_type.name.clone());
    }
    if let Some(priority) = &issue.priority {
        map.insert_one(FIELD_PRIORITY, priority.name.clone());
    }
    if let Some(status) = &issue.status {
        map.insert_one(FIELD_STATUS, status.name.clone());
    }
    if let Some(resolution) = &issue.resolution {
        map.insert_one(FIELD_RESOLUTION, resolution.name.clone());
    }

    map.extend(custom_defect_fields(issue, config));
    map
}

/// Build the custom-field portion of the defect record.
///
/// Configured SELECT fields are seeded with the empty sentinel first, so
/// an issue lacking a value still reports the field. Then every named
/// issue field whose declared type is known is formatted per its type.
pub fn custom_defect_fields(issue: &Issue, config: &Config) -> FieldMap {
    let mut map = FieldMap::new();

    for cf in &config.custom_fields {
        if cf.field_type == FieldType::Select {
            map.insert_one(cf.name.clone(), EMPTY_SELECT_OPTION);
        }
    }

    for field in &issue.fields {
        if field.value.is_null() {
            continue;
        }
        let Some(field_type) = super::custom_field_type(config, &field.name) else {
            continue;
        };
        let mut value = match field_type {
            FieldType::Select => match field.value.get("value").and_then(|v| v.as_str()) {
                Some(v) => v.to_string(),
                None => {
                    tracing::warn!(
                        "error getting the field {} value: not a select object",
                        field.name
                    );
                    String::new()
                }
            },
            _ => scalar_value(&field.value),
        };
        if field_type == FieldType::Date {
            match dates::parse_custom_field(&value) {
                Some(parsed) => value = dates::format_wire(parsed),
                None => tracing::warn!("error parsing the date: {}", value),
            }
        }
        map.insert_one(field.name.clone(), value);
    }

    map
}

/// The NEW_DEFECT field template: every standard or custom remote field,
/// by display name, with no value yet.
pub fn default_defect_fields(remote_fields: &[RemoteField]) -> FieldMap {
    let mut map = FieldMap::new();
    for field in remote_fields {
        if jg_core::fields::is_standard_field_id(&field.id)
            || field.id.starts_with(CUSTOM_FIELD_ID_PREFIX)
        {
            map.insert(field.name.clone(), Vec::new());
        }
    }
    map
}

/// Coerce a non-select field value to the engine's string form:
/// strings pass through, arrays join with the multi-value separator,
/// numbers print themselves.
fn scalar_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(MULTI_VALUE_SEPARATOR),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
#[path = "outbound_tests.rs"]
mod tests;
