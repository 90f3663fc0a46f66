// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Field type registry: data types, access levels, the standard issue
//! field tables and the ordered field map used for defect records.
//!
//! The orchestration engine models every defect as a flat list of named
//! string fields. The names on the wire are the human-readable JIRA field
//! names ("Issue Key", "Fix Version/s", ...); the remote ids ("key",
//! "fixVersions", ...) only appear in JQL and REST payloads.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::Error;

/// Standard field names as the engine sees them.
pub const FIELD_KEY: &str = "Issue Key";
pub const FIELD_ISSUETYPE: &str = "Issue Type";
pub const FIELD_SUMMARY: &str = "Summary";
pub const FIELD_PRIORITY: &str = "Priority";
pub const FIELD_DUEDATE: &str = "Due Date";
pub const FIELD_COMPONENTS: &str = "Component/s";
pub const FIELD_AFFECTSVERSIONS: &str = "Affects Version/s";
pub const FIELD_FIXVERSIONS: &str = "Fix Version/s";
pub const FIELD_ASSIGNEE: &str = "Assignee";
pub const FIELD_REPORTER: &str = "Reporter";
pub const FIELD_ENVIRONMENT: &str = "Environment";
pub const FIELD_DESCRIPTION: &str = "Description";
pub const FIELD_COMMENTS: &str = "Comments";
pub const FIELD_STATUS: &str = "Status";
pub const FIELD_RESOLUTION: &str = "Resolution";
pub const FIELD_UPDATED: &str = "Updated";
pub const FIELD_CREATED: &str = "Created";

/// Synthetic combination field exposing status and resolution together.
pub const FIELD_STATUS_RESOLUTION: &str = "Status/Resolution";

/// Synthetic field whose value becomes a comment on the issue.
pub const FIELD_FIX: &str = "Fix";

/// Select option sentinel meaning "no value".
pub const EMPTY_SELECT_OPTION: &str = "<Empty>";

/// Special project value meaning every project.
pub const PROJECT_ALL: &str = "*All*";

/// Pseudo-field carrying the owning project of a defect.
pub const PROJECT_FIELD: &str = "*Project*";

/// Separator between project keys in a PROJECT_LIST attribute.
pub const PROJECT_SEPARATOR: &str = ",";

/// Separator used when joining multi-valued fields (versions, components).
pub const MULTI_VALUE_SEPARATOR: &str = ", ";

/// Separator used when concatenating issue comments.
pub const COMMENT_SEPARATOR: &str = "\n------\n";

/// Remote id prefix identifying custom fields.
pub const CUSTOM_FIELD_ID_PREFIX: &str = "customfield_";

/// Default summary applied to newly created issues.
pub const DEFAULT_ISSUE_SUMMARY: &str = "New Issue";

/// Standard field name to remote field id table, in substitution order.
///
/// The trailing sentinel entry maps `<Empty>` to the empty string so that
/// inbound select values carrying the sentinel resolve to "no value".
pub const STANDARD_FIELDS: &[(&str, &str)] = &[
    (FIELD_KEY, "key"),
    (FIELD_ISSUETYPE, "issuetype"),
    (FIELD_SUMMARY, "summary"),
    (FIELD_PRIORITY, "priority"),
    (FIELD_DUEDATE, "dueDate"),
    (FIELD_COMPONENTS, "components"),
    (FIELD_AFFECTSVERSIONS, "versions"),
    (FIELD_FIXVERSIONS, "fixVersions"),
    (FIELD_ASSIGNEE, "assignee"),
    (FIELD_REPORTER, "reporter"),
    (FIELD_ENVIRONMENT, "environment"),
    (FIELD_DESCRIPTION, "description"),
    (FIELD_COMMENTS, "comments"),
    (FIELD_STATUS, "status"),
    (FIELD_RESOLUTION, "resolution"),
    (FIELD_UPDATED, "updated"),
    (FIELD_CREATED, "created"),
    (EMPTY_SELECT_OPTION, ""),
];

/// Look up the remote field id for a standard field name.
pub fn remote_field_id(name: &str) -> Option<&'static str> {
    STANDARD_FIELDS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, id)| *id)
}

/// Returns true if the remote id belongs to a standard field.
pub fn is_standard_field_id(id: &str) -> bool {
    STANDARD_FIELDS.iter().any(|(_, i)| *i == id && !i.is_empty())
}

/// Data type of a defect field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single token, no whitespace.
    Word,
    /// One line of text.
    Line,
    /// Multi-line text.
    Text,
    /// Date in the wire format.
    Date,
    /// One of a fixed set of options.
    Select,
    /// Synthetic fix field (value becomes a comment).
    Fix,
}

impl FieldType {
    /// Wire representation used in DESC responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Word => "WORD",
            FieldType::Line => "LINE",
            FieldType::Text => "TEXT",
            FieldType::Date => "DATE",
            FieldType::Select => "SELECT",
            FieldType::Fix => "FIX",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "word" => Ok(FieldType::Word),
            "line" => Ok(FieldType::Line),
            "text" => Ok(FieldType::Text),
            "date" => Ok(FieldType::Date),
            "select" => Ok(FieldType::Select),
            "fix" => Ok(FieldType::Fix),
            _ => Err(Error::InvalidFieldType(s.to_string())),
        }
    }
}

/// Access level of a defect field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Read-write.
    Rw,
    /// Read-only.
    Ro,
    /// The modification date field.
    ModDate,
    /// The modified-by-user field.
    ModUser,
    /// The defect identifier field.
    DefectId,
}

impl Access {
    /// Numeric code used in DESC responses.
    pub fn code(&self) -> u8 {
        match self {
            Access::Rw => 0,
            Access::Ro => 1,
            Access::ModDate => 2,
            Access::ModUser => 3,
            Access::DefectId => 4,
        }
    }
}

impl FromStr for Access {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "rw" => Ok(Access::Rw),
            "ro" => Ok(Access::Ro),
            _ => Err(Error::InvalidAccess(s.to_string())),
        }
    }
}

/// An insertion-ordered name -> values multimap.
///
/// This is the in-memory shape of a defect record: field order is
/// significant on the wire, names are looked up exactly, and replacing a
/// value keeps the field's original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldMap {
    pub fn new() -> Self {
        FieldMap {
            entries: Vec::new(),
        }
    }

    /// Insert or replace a field, keeping its original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = values;
        } else {
            self.entries.push((name, values));
        }
    }

    /// Insert or replace a single-valued field.
    pub fn insert_one(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(name, vec![value.into()]);
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// First value of a field, if present and non-empty.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Absorb all entries of `other`, replacing fields already present.
    pub fn extend(&mut self, other: FieldMap) {
        for (name, values) in other.entries {
            self.insert(name, values);
        }
    }
}

impl FromIterator<(String, Vec<String>)> for FieldMap {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        let mut map = FieldMap::new();
        for (name, values) in iter {
            map.insert(name, values);
        }
        map
    }
}

#[cfg(test)]
#[path = "fields_tests.rs"]
mod tests;
