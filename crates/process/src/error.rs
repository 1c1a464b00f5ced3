// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by [`crate::signal`]'s signal-delivery helpers.
//!
//! Spawn and pipe I/O failures are NOT modeled here: they surface as a
//! `ProcessExited` event (spawn) or a logged-and-dropped pump iteration
//! (I/O), never as a `Result::Err` a caller must propagate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("invalid signal number {signal_number}")]
    InvalidSignal { signal_number: i32 },

    #[error("failed to deliver signal: {source}")]
    Kill { source: nix::errno::Errno },
}
