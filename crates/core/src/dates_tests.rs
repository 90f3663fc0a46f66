// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::NaiveDate;
use yare::parameterized;

#[parameterized(
    already_clean = { "2018/01/01 12:12:00", "2018/01/01 12:12:00" },
    padded_date = { "2014/ 3/ 6 11:39: 3", "2014/3/6 11:39:3" },
    padded_month = { "2018/ 1/ 1 12:12", "2018/1/1 12:12" },
)]
fn normalize_strips_space_padding(input: &str, expected: &str) {
    assert_eq!(normalize(input), expected);
}

#[test]
fn parse_wire_accepts_space_padding() {
    let dt = parse_wire("2014/ 3/ 6 11:39: 3").unwrap();
    assert_eq!(format_wire(dt), "2014/03/06 11:39:03");
}

#[test]
fn parse_wire_rejects_garbage() {
    assert!(parse_wire("yesterday").is_err());
}

#[test]
fn parse_jql_accepts_wire_and_short_formats() {
    let with_seconds = parse_jql("2018/01/01 12:12:33").unwrap();
    assert_eq!(format_jql(with_seconds), "2018/01/01 12:12");

    let short = parse_jql("2018/ 1/ 1 12:12").unwrap();
    assert_eq!(format_jql(short), "2018/01/01 12:12");
}

#[test]
fn due_date_round_trip_preserves_calendar_date() {
    // Time of day is not preserved for due dates, only the date.
    for input in ["7/Aug/26", "07/Aug/26", "30/Jan/24"] {
        let date = parse_due_date(input).unwrap();
        let formatted = format_due_date(date);
        assert_eq!(parse_due_date(&formatted).unwrap(), date);
    }
}

#[test]
fn format_due_date_unpadded_day() {
    let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
    assert_eq!(format_due_date(date), "7/Aug/26");
}

#[test]
fn custom_field_parses_date_time_first() {
    let dt = parse_custom_field("07/Aug/26 3:45 PM").unwrap();
    assert_eq!(format_custom_field(dt), "07/Aug/26 3:45 PM");
}

#[test]
fn custom_field_falls_back_to_date_only() {
    let dt = parse_custom_field("07/Aug/26").unwrap();
    assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());
    assert_eq!(dt.time(), chrono::NaiveTime::default());
}

#[test]
fn custom_field_unparseable_is_none() {
    assert!(parse_custom_field("2026-08-07").is_none());
}

#[test]
fn server_info_ignores_zone_offset() {
    let dt = parse_server_info("2026-08-07T11:39:03.000+0200").unwrap();
    assert_eq!(format_wire(dt), "2026/08/07 11:39:03");

    let bare = parse_server_info("2026-08-07T11:39:03.000").unwrap();
    assert_eq!(bare, dt);
}
