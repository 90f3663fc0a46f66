// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Field mapping between defect records and remote issues.
//!
//! Outbound: a remote issue becomes the engine's flat name/value field
//! list. Inbound: engine fields become REST field inputs for updates and
//! creates. Status changes never travel as plain fields — they go
//! through workflow transitions, resolved here.

use jg_core::{fields, Config, Workflow};

use crate::error::{GatewayError, Result, TransitionFailure};
use crate::jira::{Issue, JiraApi, TransitionOption};

mod inbound;
mod outbound;

pub use inbound::{build_create_input, translate_update_fields};
pub use outbound::{custom_defect_fields, defect_fields, default_defect_fields};

/// Whether the requested status (with its paired resolution, when given)
/// differs from the issue's current status/resolution pair.
///
/// Both sides are compared as `status[/resolution]` strings,
/// case-insensitively. Without a requested status, or without a current
/// status on the issue, there is nothing to compare and the answer is no.
pub fn is_different_status_resolution(issue: &Issue, fields: &jg_core::FieldMap) -> bool {
    let Some(status) = fields
        .first(fields::FIELD_STATUS)
        .filter(|s| !s.trim().is_empty())
    else {
        return false;
    };
    let Some(current_status) = issue.status.as_ref() else {
        return false;
    };

    let mut requested = status.to_string();
    if let Some(resolution) = fields
        .first(fields::FIELD_RESOLUTION)
        .filter(|r| !r.trim().is_empty())
    {
        requested.push('/');
        requested.push_str(resolution);
    }

    let mut current = current_status.name.clone();
    if let Some(resolution) = issue.resolution.as_ref() {
        current.push('/');
        current.push_str(&resolution.name);
    }

    !current.eq_ignore_ascii_case(&requested)
}

/// Find the remote transition that moves the issue to `target_status`.
///
/// The workflow configuration names the candidate transitions; the
/// remote issue decides which of them is currently offered. The first
/// remote transition whose name matches a configured candidate wins.
pub fn transition_for_target_status(
    api: &dyn JiraApi,
    workflows: &[Workflow],
    issue: &Issue,
    target_status: &str,
) -> Result<TransitionOption> {
    let current = issue.status_name().to_string();
    let matcher = jg_core::TransitionMatcher::new(workflows);
    let candidates = matcher.matching_transitions(&current, target_status);
    if candidates.is_empty() {
        return Err(no_transition(
            TransitionFailure::NotConfigured,
            issue,
            &current,
            target_status,
        ));
    }

    let available = api
        .transitions(&issue.key)
        .map_err(|e| GatewayError::remote(format!("saving defect: {}", issue.key), e))?;
    if available.is_empty() {
        return Err(no_transition(
            TransitionFailure::NoneAvailable,
            issue,
            &current,
            target_status,
        ));
    }

    available
        .into_iter()
        .find(|t| candidates.iter().any(|c| *c == t.name))
        .ok_or_else(|| {
            no_transition(
                TransitionFailure::NoMatch,
                issue,
                &current,
                target_status,
            )
        })
}

fn no_transition(
    kind: TransitionFailure,
    issue: &Issue,
    current: &str,
    target: &str,
) -> GatewayError {
    GatewayError::NoTransition {
        kind,
        issue_key: issue.key.clone(),
        current_status: current.to_string(),
        target_status: target.to_string(),
    }
}

/// Interpose `Config` for custom field type lookup by display name.
/// Only declared fields have a type; everything else is opaque.
pub(crate) fn custom_field_type(
    config: &Config,
    name: &str,
) -> Option<jg_core::FieldType> {
    config.custom_field(name).map(|cf| cf.field_type)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
