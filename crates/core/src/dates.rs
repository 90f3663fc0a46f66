// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Date format conversions between the wire protocol, JQL and the JIRA
//! field renderings.
//!
//! The orchestration engine pads date components with spaces instead of
//! zeros (`2014/ 3/ 6 11:39: 3`), so every wire-side parse goes through
//! [`normalize`] first.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Error, Result};

/// Wire protocol date-time format (`yyyy/MM/dd HH:mm:ss`).
pub const WIRE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// JQL date literal format (`yyyy/MM/dd HH:mm`).
pub const JQL_FORMAT: &str = "%Y/%m/%d %H:%M";

/// JIRA due date rendering (`d/MMM/yy`), e.g. `7/Aug/26`.
pub const DUE_DATE_FORMAT: &str = "%d/%b/%y";

/// JIRA custom date field rendering (`dd/MMM/yy`).
pub const CUSTOM_FIELD_DATE_FORMAT: &str = "%d/%b/%y";

/// JIRA custom date-time field rendering (`dd/MMM/yy h:mm a`).
pub const CUSTOM_FIELD_DATE_TIME_FORMAT: &str = "%d/%b/%y %I:%M %p";

/// JIRA server info timestamp, time zone ignored on purpose: the gateway
/// and the JIRA server may sit in different zones and the engine compares
/// wall-clock strings.
pub const SERVER_INFO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Strip the engine's space padding from date components.
pub fn normalize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut after_sep = false;
    for c in value.chars() {
        if after_sep && c == ' ' {
            continue;
        }
        after_sep = c == '/' || c == ':';
        out.push(c);
    }
    out
}

/// Parse a wire-format date-time, tolerating space padding.
pub fn parse_wire(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&normalize(value), WIRE_FORMAT).map_err(|_| Error::InvalidDate {
        value: value.to_string(),
        format: WIRE_FORMAT,
    })
}

pub fn format_wire(dt: NaiveDateTime) -> String {
    dt.format(WIRE_FORMAT).to_string()
}

/// Parse a date destined for a JQL literal. Accepts the wire format (with
/// seconds) and the shorter JQL format.
pub fn parse_jql(value: &str) -> Result<NaiveDateTime> {
    let normalized = normalize(value);
    NaiveDateTime::parse_from_str(&normalized, WIRE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, JQL_FORMAT))
        .map_err(|_| Error::InvalidDate {
            value: value.to_string(),
            format: JQL_FORMAT,
        })
}

pub fn format_jql(dt: NaiveDateTime) -> String {
    dt.format(JQL_FORMAT).to_string()
}

/// Parse a due date in the JIRA rendering (`7/Aug/26`).
pub fn parse_due_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DUE_DATE_FORMAT).map_err(|_| Error::InvalidDate {
        value: value.to_string(),
        format: DUE_DATE_FORMAT,
    })
}

/// Format a due date in the JIRA rendering. The day is not zero-padded.
pub fn format_due_date(date: NaiveDate) -> String {
    date.format("%-d/%b/%y").to_string()
}

/// Parse a custom date field value: try the date-time rendering first,
/// then the date-only rendering (midnight).
pub fn parse_custom_field(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, CUSTOM_FIELD_DATE_TIME_FORMAT) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, CUSTOM_FIELD_DATE_FORMAT)
        .ok()
        .map(|d| d.and_time(NaiveTime::default()))
}

/// Format a date-time in the custom field date-time rendering.
pub fn format_custom_field(dt: NaiveDateTime) -> String {
    dt.format("%d/%b/%y %-I:%M %p").to_string()
}

/// Parse a server info timestamp, ignoring any trailing zone offset.
pub fn parse_server_info(value: &str) -> Result<NaiveDateTime> {
    // "2026-08-07T11:39:03.000+0200" -> keep "2026-08-07T11:39:03.000"
    let trimmed = value.trim();
    let bare = trimmed.get(..23).unwrap_or(trimmed);
    NaiveDateTime::parse_from_str(bare, SERVER_INFO_FORMAT).map_err(|_| Error::InvalidDate {
        value: value.to_string(),
        format: SERVER_INFO_FORMAT,
    })
}

#[cfg(test)]
#[path = "dates_tests.rs"]
mod tests;
