// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use jg_core::UserStyle;

fn cloud_user() -> User {
    User {
        name: None,
        email: Some("pat.doe@example.com".into()),
        display_name: Some("Pat Doe".into()),
    }
}

#[test]
fn first_style_with_value_wins() {
    let user = User {
        name: Some("pdoe".into()),
        ..cloud_user()
    };
    let styles = UserStyle::default_order();
    assert_eq!(user_value(&user, &styles), Some("pdoe".to_string()));
}

#[test]
fn falls_through_missing_name() {
    let styles = UserStyle::default_order();
    assert_eq!(
        user_value(&cloud_user(), &styles),
        Some("pat.doe@example.com".to_string())
    );
}

#[test]
fn emailshort_cuts_at_sign() {
    let styles = [UserStyle::EmailShort];
    assert_eq!(
        user_value(&cloud_user(), &styles),
        Some("pat.doe".to_string())
    );
}

#[test]
fn emailshort_keeps_tiny_local_part() {
    let user = User {
        email: Some("a@example.com".into()),
        ..User::default()
    };
    assert_eq!(
        user_value(&user, &[UserStyle::EmailShort]),
        Some("a@example.com".to_string())
    );
}

#[test]
fn display_name_only() {
    let user = User {
        display_name: Some("Pat Doe".into()),
        ..User::default()
    };
    assert_eq!(
        user_value(&user, &UserStyle::default_order()),
        Some("Pat Doe".to_string())
    );
}

#[test]
fn nothing_resolves_to_none() {
    assert_eq!(user_value(&User::default(), &UserStyle::default_order()), None);
    assert_eq!(user_value(&cloud_user(), &[UserStyle::Name]), None);
}
