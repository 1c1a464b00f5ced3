// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn ids_are_unique_and_stable() {
    let a = ActionId::next();
    let b = ActionId::next();
    assert_ne!(a, b);
    assert_eq!(a, a);
}

#[test]
fn display_is_human_readable() {
    let a = ActionId::next();
    assert!(a.to_string().starts_with("action#"));
}
