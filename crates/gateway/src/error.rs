// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway error taxonomy.
//!
//! Every domain failure raised inside a request handler is a value, not a
//! panic: the dispatch boundary converts it to an `ERROR` response and
//! the connection continues. Only transport failures kill the connection.

use std::fmt;

use jg_wire::Response;
use thiserror::Error;

/// Why a status transition could not be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionFailure {
    /// No workflow defines a transition between the two statuses.
    NotConfigured,
    /// The remote issue currently offers no transitions at all.
    NoneAvailable,
    /// None of the remote issue's transitions match the configured names.
    NoMatch,
}

impl fmt::Display for TransitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TransitionFailure::NotConfigured => {
                "no transition defined for current status to target status"
            }
            TransitionFailure::NoneAvailable => "no transitions available for current status",
            TransitionFailure::NoMatch => "no matching transition found for current status",
        };
        write!(f, "{}", text)
    }
}

/// Domain failures reported to the engine as ERROR responses.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Missing {1} in {0}")]
    MissingAttribute(&'static str, &'static str),

    #[error("Invalid {1} in {0}")]
    InvalidAttribute(&'static str, &'static str),

    #[error("Unknown project: {0}")]
    UnknownProject(String),

    #[error("Unknown project requested: {0}")]
    UnknownProjectRequested(String),

    #[error("Defect: {0} not found")]
    DefectNotFound(String),

    #[error("Invalid date")]
    InvalidDate,

    #[error("invalid query date '{0}'")]
    InvalidQueryDate(String),

    #[error("Segmentation on Status/Resolution field is not supported")]
    StatusResolutionSegment,

    #[error(
        "Error occurred while saving defect: {kind}: issue key ({issue_key}), \
         current status ({current_status}), target status ({target_status})"
    )]
    NoTransition {
        kind: TransitionFailure,
        issue_key: String,
        current_status: String,
        target_status: String,
    },

    #[error(
        "The gateway user does not have access to any of the projects in the segment; \
         must have one."
    )]
    NoProjectAccess,

    #[error("Error occurred while {action}: {message}")]
    Remote { action: String, message: String },

    #[error(
        "Error occurred while logging into the JIRA server. Please make sure the \
         JIRA server URL, username and password are correct. {0}"
    )]
    Login(String),

    #[error("Not logged in")]
    NotLoggedIn,
}

impl GatewayError {
    /// Wrap a remote-service failure with the action being performed.
    pub fn remote(action: impl Into<String>, err: impl fmt::Display) -> Self {
        GatewayError::Remote {
            action: action.into(),
            message: err.to_string(),
        }
    }

    /// Whether the engine may keep using the connection. The protocol
    /// never signals a non-continuable error distinctly, so this is
    /// uniformly false.
    pub fn can_continue(&self) -> bool {
        false
    }

    /// Render as an ERROR response for the wire.
    pub fn to_response(&self) -> Response {
        Response::Error {
            message: self.to_string(),
            can_continue: self.can_continue(),
        }
    }
}

/// A specialized Result type for gateway request handling.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
