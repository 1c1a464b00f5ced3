// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for [`crate::service::LaunchService`].

use thiserror::Error;

/// Errors raised by [`crate::service::LaunchService`]'s public contract.
///
/// A handler failure surfaces as a non-zero `run` exit code, not an `Err`
/// — the only rejection path is re-entrant `run`.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// `run` was called while a previous `run` call on the same service was
    /// still in progress. The second call fails outright; no child process
    /// is spawned twice.
    #[error("LaunchService::run is already in progress")]
    AlreadyRunning,
}
