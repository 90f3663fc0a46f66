// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for jg-core operations.

use thiserror::Error;

/// All possible errors that can occur in jg-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid date '{value}' (expected {format})")]
    InvalidDate { value: String, format: &'static str },

    #[error("invalid field type: '{0}'\n  hint: valid types are: word, line, text, date, select")]
    InvalidFieldType(String),

    #[error("invalid field access: '{0}'\n  hint: valid access levels are: rw, ro")]
    InvalidAccess(String),

    #[error(
        "invalid user style: '{0}'\n  hint: valid styles are: name, email, emailshort, displayname"
    )]
    InvalidUserStyle(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for jg-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
