// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User-name resolution.
//!
//! On-premises JIRA exposes a login name that typically matches the
//! engine-side user; cloud deployments leave it null. The configured
//! style order decides which candidate representation of a user is
//! reported to the engine: the first style that yields a value wins.

use jg_core::UserStyle;

use crate::jira::User;

/// Resolve the engine-facing value for a user through the configured
/// style order. Returns `None` when no style yields a value.
pub fn user_value(user: &User, styles: &[UserStyle]) -> Option<String> {
    for style in styles {
        let value = match style {
            UserStyle::Name => user.name.clone(),
            UserStyle::Email => user.email.clone(),
            UserStyle::EmailShort => user.email.as_ref().map(|email| short_email(email)),
            UserStyle::DisplayName => user.display_name.clone(),
        };
        if let Some(value) = value {
            return Some(value);
        }
    }
    None
}

/// Everything before the `@`. An address with the `@` in the first two
/// positions is returned whole.
fn short_email(email: &str) -> String {
    match email.find('@') {
        Some(at) if at > 1 => email[..at].to_string(),
        _ => email.to_string(),
    }
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
