// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the launch runtime core.

use thiserror::Error;

/// Errors raised while expanding a [`crate::substitution::Substitution`].
///
/// Surfaces as a handler/task failure, which the caller should
/// treat as loop-fatal (triggers `Shutdown`) rather than propagate silently.
#[derive(Debug, Error)]
pub enum SubstitutionError {
    #[error("substitution failed: {reason}")]
    ResolutionFailed { reason: String },
}

/// Errors raised by [`crate::context::LaunchContext`] and the dispatch loop.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Substitution(#[from] SubstitutionError),

    #[error("event handler raised: {reason}")]
    HandlerFailed { reason: String },

    #[error("entity returned by a handler was not a valid LaunchDescriptionEntity: {detail}")]
    InvalidEntity { detail: String },
}
