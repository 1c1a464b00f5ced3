// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local identity for [`crate::entity::Action`] instances.
//!
//! Lets a matcher compare an event's `action` field against a specific
//! `ProcessAction` instance without holding a reference to it. An
//! `AtomicU64` counter handed out at construction time is cheap, `Copy`,
//! and stable for the lifetime of the action.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-local identifier for a [`crate::entity::Action`].
///
/// Two actions never share an `ActionId`; the same action always reports the
/// same one. Used as the key into [`crate::context::LaunchContext`]'s process
/// table and as the payload carried by process-related [`crate::event::Event`]
/// variants so handlers can test "is this event about *my* action".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(u64);

impl ActionId {
    /// Allocate a fresh, never-before-seen id.
    pub fn next() -> Self {
        Self(NEXT_ACTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "action#{}", self.0)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
