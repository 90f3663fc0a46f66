// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway configuration management.
//!
//! Configuration is stored in a TOML file and includes:
//! - `[[custom_field]]`: tracker-specific fields with a declared type,
//!   access level and (for selects) the allowed option values
//! - `[[workflow]]`: the workflow graph used for status transitions
//! - `[handling]`: scalar handling options (ignored projects, query
//!   style, user-name resolution order, remote-call timeouts)
//!
//! The configuration is loaded once per session and is immutable
//! afterwards; the workflow graph is injected into the transition matcher
//! exactly once.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::fields::{Access, FieldType};
use crate::workflow::{resolution_statuses, Workflow};

/// Query style value that enables the legacy all-projects default.
pub const QUERY_STYLE_LEGACY: &str = "2014.1";

const DEFAULT_SOCKET_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PROJECT_REFRESH_COUNT: u32 = 30;

/// A configuration-declared custom field.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub access: Access,
    #[serde(default)]
    pub options: Vec<String>,
}

/// User-name resolution styles, tried in configured order.
///
/// On-premises JIRA exposes a login name; cloud deployments may not, so
/// the gateway falls back across these candidate representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStyle {
    Name,
    Email,
    EmailShort,
    DisplayName,
}

impl UserStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStyle::Name => "name",
            UserStyle::Email => "email",
            UserStyle::EmailShort => "emailshort",
            UserStyle::DisplayName => "displayname",
        }
    }

    /// The default resolution order.
    pub fn default_order() -> Vec<UserStyle> {
        vec![
            UserStyle::Name,
            UserStyle::Email,
            UserStyle::EmailShort,
            UserStyle::DisplayName,
        ]
    }
}

impl fmt::Display for UserStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserStyle {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(UserStyle::Name),
            "email" => Ok(UserStyle::Email),
            "emailshort" => Ok(UserStyle::EmailShort),
            "displayname" => Ok(UserStyle::DisplayName),
            _ => Err(Error::InvalidUserStyle(s.to_string())),
        }
    }
}

/// Raw `[handling]` table as written in the file.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawHandling {
    #[serde(default)]
    ignore_projects: Vec<String>,
    #[serde(default)]
    query_style: Option<String>,
    #[serde(default)]
    user_name_style: Vec<String>,
    #[serde(default)]
    socket_timeout_secs: Option<i64>,
    #[serde(default)]
    request_timeout_secs: Option<i64>,
    #[serde(default)]
    connection_timeout_secs: Option<i64>,
    #[serde(default)]
    project_refresh_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default, rename = "custom_field")]
    custom_fields: Vec<CustomField>,
    #[serde(default, rename = "workflow")]
    workflows: Vec<Workflow>,
    #[serde(default)]
    handling: RawHandling,
}

/// Validated gateway configuration, immutable after load.
#[derive(Debug, Clone)]
pub struct Config {
    pub custom_fields: Vec<CustomField>,
    pub workflows: Vec<Workflow>,
    ignore_projects: Vec<String>,
    query_style: Option<String>,
    user_styles: Vec<UserStyle>,
    socket_timeout: Duration,
    request_timeout: Duration,
    connection_timeout: Duration,
    project_refresh_count: u32,
    resolution_statuses: Vec<String>,
}

impl Config {
    /// Loads and validates configuration from the given TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        if raw.workflows.is_empty() {
            return Err(Error::Config(
                "there are no workflows in the config file".to_string(),
            ));
        }
        validate_transitions(&raw.workflows)?;

        let user_styles = if raw.handling.user_name_style.is_empty() {
            UserStyle::default_order()
        } else {
            raw.handling
                .user_name_style
                .iter()
                .map(|s| s.parse())
                .collect::<Result<Vec<UserStyle>>>()?
        };

        let resolution_statuses = resolution_statuses(&raw.workflows);

        Ok(Config {
            ignore_projects: raw
                .handling
                .ignore_projects
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            query_style: raw.handling.query_style.clone(),
            user_styles,
            socket_timeout: timeout_or_default(
                raw.handling.socket_timeout_secs,
                "socket_timeout_secs",
                DEFAULT_SOCKET_TIMEOUT_SECS,
            ),
            request_timeout: timeout_or_default(
                raw.handling.request_timeout_secs,
                "request_timeout_secs",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            connection_timeout: timeout_or_default(
                raw.handling.connection_timeout_secs,
                "connection_timeout_secs",
                DEFAULT_CONNECTION_TIMEOUT_SECS,
            ),
            project_refresh_count: raw
                .handling
                .project_refresh_count
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_PROJECT_REFRESH_COUNT),
            custom_fields: raw.custom_fields,
            workflows: raw.workflows,
            resolution_statuses,
        })
    }

    /// Looks up a custom field by declared name (case-insensitive,
    /// trimmed). Only the first matching declaration counts; custom field
    /// names are expected to be unique.
    pub fn custom_field(&self, name: &str) -> Option<&CustomField> {
        self.custom_fields
            .iter()
            .find(|cf| cf.name.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// Returns true if the project is on the ignore list.
    pub fn is_ignored_project(&self, project: &str) -> bool {
        self.ignore_projects.iter().any(|p| p == project)
    }

    pub fn ignore_projects(&self) -> &[String] {
        &self.ignore_projects
    }

    /// Returns true if the legacy all-projects query style is configured.
    pub fn query_legacy(&self) -> bool {
        self.query_style.as_deref() == Some(QUERY_STYLE_LEGACY)
    }

    pub fn user_styles(&self) -> &[UserStyle] {
        &self.user_styles
    }

    pub fn socket_timeout(&self) -> Duration {
        self.socket_timeout
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// How many all-projects accesses between wholesale cache refreshes.
    pub fn project_refresh_count(&self) -> u32 {
        self.project_refresh_count
    }

    /// Returns true if the status is reachable via a resolution
    /// transition in any workflow.
    pub fn is_resolution_status(&self, status: &str) -> bool {
        self.resolution_statuses.iter().any(|s| s == status)
    }
}

/// A transition name must resolve to exactly one destination step across
/// the whole configuration.
fn validate_transitions(workflows: &[Workflow]) -> Result<()> {
    let mut seen: Vec<(&str, &str)> = Vec::new();
    for workflow in workflows {
        for step in &workflow.steps {
            for transition in &step.transitions {
                let name = transition.name.trim();
                let dest = transition.destination_step.trim();
                if name.is_empty() || dest.is_empty() {
                    continue;
                }
                if let Some((_, prior)) = seen
                    .iter()
                    .find(|(n, _)| n.eq_ignore_ascii_case(name))
                {
                    if *prior != dest {
                        return Err(Error::Config(format!(
                            "transition '{}' has different destination steps: '{}' '{}'",
                            name, prior, dest
                        )));
                    }
                } else {
                    seen.push((name, dest));
                }
            }
        }
    }
    Ok(())
}

fn timeout_or_default(configured: Option<i64>, key: &str, default_secs: u64) -> Duration {
    match configured {
        Some(secs) if secs >= 1 => Duration::from_secs(secs as u64),
        Some(secs) => {
            tracing::warn!(
                "config value for handling.{} must be > 0, got {}; using default",
                key,
                secs
            );
            Duration::from_secs(default_secs)
        }
        None => Duration::from_secs(default_secs),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
