// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound mapping: defect record -> remote issue input.
//!
//! Value names the engine sends (issue type, priority, status,
//! resolution) are re-resolved against remote metadata; they are never
//! passed through as literal strings.

use serde_json::json;

use jg_core::fields::{
    remote_field_id, EMPTY_SELECT_OPTION, FIELD_AFFECTSVERSIONS, FIELD_ASSIGNEE,
    FIELD_COMPONENTS, FIELD_DESCRIPTION, FIELD_DUEDATE, FIELD_ENVIRONMENT, FIELD_FIX,
    FIELD_FIXVERSIONS, FIELD_ISSUETYPE, FIELD_PRIORITY, FIELD_REPORTER, FIELD_RESOLUTION,
    FIELD_STATUS, FIELD_SUMMARY, FIELD_UPDATED, DEFAULT_ISSUE_SUMMARY, MULTI_VALUE_SEPARATOR,
};
use jg_core::{dates, Config, FieldMap, FieldType};

use crate::error::{GatewayError, Result};
use crate::jira::{id_for_name, IssueInput, JiraApi};

/// Translate engine update fields into a full-issue update input.
///
/// Date fields are reformatted to the remote renderings, enumerated
/// fields are resolved to ids, multi-value fields are split back into
/// name arrays, and custom fields follow their declared types. Fields
/// whose resolved value is an empty select are dropped rather than sent.
pub fn translate_update_fields(
    defect_fields: &FieldMap,
    api: &dyn JiraApi,
    config: &Config,
) -> Result<IssueInput> {
    let mut input = IssueInput::new();

    if let Some(due) = defect_fields.first(FIELD_DUEDATE) {
        match dates::parse_wire(due) {
            Ok(parsed) => {
                set_plain(&mut input, FIELD_DUEDATE, dates::format_due_date(parsed.date()));
            }
            Err(e) => tracing::warn!("{}", e),
        }
    }
    if let Some(updated) = defect_fields.first(FIELD_UPDATED) {
        match dates::parse_wire(updated) {
            Ok(parsed) => {
                set_plain(&mut input, FIELD_UPDATED, dates::format_due_date(parsed.date()));
            }
            Err(e) => tracing::warn!("{}", e),
        }
    }
    if let Some(fix) = defect_fields.first(FIELD_FIX) {
        // The fix text travels as a comment.
        input.set("comments", json!(fix));
    }
    for name in [
        FIELD_SUMMARY,
        FIELD_REPORTER,
        FIELD_ASSIGNEE,
        FIELD_DESCRIPTION,
        FIELD_ENVIRONMENT,
    ] {
        if let Some(value) = defect_fields.first(name) {
            set_plain(&mut input, name, value.to_string());
        }
    }

    if let Some(name) = defect_fields.first(FIELD_ISSUETYPE) {
        let issue_types = remote(api.issue_types(), "updating defect")?;
        if let Some(entry) = id_for_name(&issue_types, name) {
            set_id(&mut input, FIELD_ISSUETYPE, &entry.id);
        }
    }
    if let Some(name) = defect_fields.first(FIELD_PRIORITY) {
        let priorities = remote(api.priorities(), "updating defect")?;
        if let Some(entry) = id_for_name(&priorities, name) {
            set_id(&mut input, FIELD_PRIORITY, &entry.id);
        }
    }
    if let Some(name) = defect_fields.first(FIELD_STATUS) {
        let statuses = remote(api.statuses(), "updating defect")?;
        if let Some(entry) = id_for_name(&statuses, name) {
            set_id(&mut input, FIELD_STATUS, &entry.id);
        }
    }
    if let Some(name) = defect_fields.first(FIELD_RESOLUTION) {
        let resolutions = remote(api.resolutions(), "updating defect")?;
        if let Some(entry) = id_for_name(&resolutions, name) {
            set_id(&mut input, FIELD_RESOLUTION, &entry.id);
        }
    }

    for name in [FIELD_FIXVERSIONS, FIELD_AFFECTSVERSIONS, FIELD_COMPONENTS] {
        if let Some(value) = defect_fields.first(name) {
            if !value.trim().is_empty() {
                set_name_array(&mut input, name, value);
            }
        }
    }

    apply_custom_fields(&mut input, defect_fields, api, config, "updating defect")?;

    Ok(input)
}

/// Build the create-issue input: remote defaults first (issue type,
/// priority, acting user as assignee, default summary), then the
/// engine-supplied fields on top.
pub fn build_create_input(
    project_key: &str,
    defect_fields: &FieldMap,
    api: &dyn JiraApi,
    config: &Config,
    username: &str,
) -> Result<IssueInput> {
    let meta = remote(api.create_meta(project_key), "creating defect")?;
    // Cloud servers name the default type "Bug"; some on-premises
    // installations carry "BUG".
    let issue_type = meta
        .iter()
        .find(|t| t.name == "Bug")
        .or_else(|| meta.iter().find(|t| t.name == "BUG"))
        .ok_or_else(|| {
            GatewayError::remote(
                "creating defect",
                format!("no Bug issue type in create metadata for project {}", project_key),
            )
        })?;

    let mut input = IssueInput::new();
    input.set("project", json!({ "key": project_key }));
    input.set("summary", json!(DEFAULT_ISSUE_SUMMARY));
    input.set("issuetype", json!({ "id": issue_type.id }));
    if let Some(priority) = issue_type.priorities.first() {
        input.set("priority", json!({ "id": priority.id }));
    }
    if !username.is_empty() {
        input.set("assignee", json!({ "name": username }));
    }

    if let Some(name) = defect_fields.first(FIELD_ISSUETYPE) {
        let issue_types = remote(api.issue_types(), "creating defect")?;
        if let Some(entry) = id_for_name(&issue_types, name) {
            input.set("issuetype", json!({ "id": entry.id }));
        }
    }
    if let Some(name) = defect_fields.first(FIELD_PRIORITY) {
        let priorities = remote(api.priorities(), "creating defect")?;
        if let Some(entry) = id_for_name(&priorities, name) {
            input.set("priority", json!({ "id": entry.id }));
        }
    }
    for name in [FIELD_FIXVERSIONS, FIELD_AFFECTSVERSIONS, FIELD_COMPONENTS] {
        if let Some(value) = defect_fields.first(name) {
            if !value.trim().is_empty() {
                set_name_array(&mut input, name, value);
            }
        }
    }
    if let Some(summary) = defect_fields.first(FIELD_SUMMARY) {
        input.set("summary", json!(summary));
    }
    if let Some(reporter) = defect_fields.first(FIELD_REPORTER) {
        input.set("reporter", json!({ "name": reporter }));
    }
    if let Some(assignee) = defect_fields.first(FIELD_ASSIGNEE) {
        input.set("assignee", json!({ "name": assignee }));
    }
    if let Some(description) = defect_fields.first(FIELD_DESCRIPTION) {
        input.set("description", json!(description));
    }
    if let Some(environment) = defect_fields.first(FIELD_ENVIRONMENT) {
        input.set("environment", json!(environment));
    }
    // The engine supplies create-path dates in the remote due-date
    // rendering, unlike updates which use the wire format.
    if let Some(due) = defect_fields.first(FIELD_DUEDATE) {
        match dates::parse_due_date(due) {
            Ok(date) => input.set("duedate", json!(date.format("%Y-%m-%d").to_string())),
            Err(e) => tracing::warn!("{}", e),
        }
    }
    if let Some(updated) = defect_fields.first(FIELD_UPDATED) {
        match dates::parse_due_date(updated) {
            Ok(date) => input.set("updated", json!(date.format("%Y-%m-%d").to_string())),
            Err(e) => tracing::warn!("{}", e),
        }
    }

    apply_custom_fields(&mut input, defect_fields, api, config, "creating defect")?;

    Ok(input)
}

/// Apply configured custom fields from the defect record to the input.
fn apply_custom_fields(
    input: &mut IssueInput,
    defect_fields: &FieldMap,
    api: &dyn JiraApi,
    config: &Config,
    action: &str,
) -> Result<()> {
    let mut registry = None;
    for (name, values) in defect_fields.iter() {
        let Some(value) = values.first() else {
            continue;
        };
        let Some(field_type) = super::custom_field_type(config, name) else {
            continue;
        };
        if registry.is_none() {
            registry = Some(remote(api.fields(), action)?);
        }
        let Some(fields) = registry.as_ref() else {
            continue;
        };
        let Some(remote_field) = fields.iter().find(|f| f.custom && f.name == name) else {
            continue;
        };

        let mut value = value.to_string();
        match field_type {
            FieldType::Date => {
                match dates::parse_wire(&value) {
                    Ok(parsed) => value = dates::format_custom_field(parsed),
                    Err(e) => tracing::warn!("{}", e),
                }
                input.set(remote_field.id.clone(), json!(value));
            }
            FieldType::Select => {
                if value == EMPTY_SELECT_OPTION {
                    // The remote's representation of "no value".
                    input.set(remote_field.id.clone(), serde_json::Value::Null);
                } else if !value.is_empty() {
                    input.set(remote_field.id.clone(), json!({ "value": value }));
                }
            }
            _ => {
                input.set(remote_field.id.clone(), json!(value));
            }
        }
    }
    Ok(())
}

fn set_plain(input: &mut IssueInput, field: &str, value: String) {
    if let Some(id) = remote_field_id(field) {
        input.set(id, json!(value));
    }
}

fn set_id(input: &mut IssueInput, field: &str, id_value: &str) {
    if let Some(id) = remote_field_id(field) {
        input.set(id, json!({ "id": id_value }));
    }
}

fn set_name_array(input: &mut IssueInput, field: &str, joined: &str) {
    let Some(id) = remote_field_id(field) else {
        return;
    };
    let names: Vec<serde_json::Value> = joined
        .split(MULTI_VALUE_SEPARATOR)
        .map(|name| json!({ "name": name }))
        .collect();
    input.set(id, serde_json::Value::Array(names));
}

fn remote<T>(result: crate::jira::JiraResult<T>, action: &str) -> Result<T> {
    result.map_err(|e| GatewayError::remote(action, e))
}

#[cfg(test)]
#[path = "inbound_tests.rs"]
mod tests;
