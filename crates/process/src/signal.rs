// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! POSIX signal delivery: `signal::kill` against a `Pid`, with a
//! SIGINT → SIGTERM → SIGKILL escalation race on timeouts.

use crate::error::ProcessError;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::time::Duration;

/// The PID (or, for `shell`-wrapped children, the process group) a signal
/// targets.
fn target_pid(pid: u32, group: bool) -> Pid {
    if group {
        Pid::from_raw(-(pid as i32))
    } else {
        Pid::from_raw(pid as i32)
    }
}

/// Deliver an arbitrary numeric signal. No-op (returns `Ok`) is NOT implied
/// for an already-exited child; callers check process-table liveness first
/// so a signal targeting an exited child is a no-op.
pub fn send_signal(pid: u32, signal_number: i32, group: bool) -> Result<(), ProcessError> {
    let signal = Signal::try_from(signal_number)
        .map_err(|_| ProcessError::InvalidSignal { signal_number })?;
    signal::kill(target_pid(pid, group), signal).map_err(|source| ProcessError::Kill { source })
}

/// SIGINT, then (after `grace`) SIGTERM, then (after a second, shorter wait)
/// SIGKILL — the `ShutdownProcess` escalation. `still_running` is
/// polled between steps so an already-exited child is left alone.
pub async fn escalate_shutdown(
    pid: u32,
    group: bool,
    grace: Duration,
    still_running: impl Fn() -> bool,
) {
    let target = target_pid(pid, group);

    if !still_running() {
        return;
    }
    if let Err(source) = signal::kill(target, Signal::SIGINT) {
        tracing::debug!(pid, %source, "SIGINT delivery failed (child likely already gone)");
        return;
    }

    tokio::time::sleep(grace).await;
    if !still_running() {
        return;
    }
    if let Err(source) = signal::kill(target, Signal::SIGTERM) {
        tracing::debug!(pid, %source, "SIGTERM delivery failed");
        return;
    }

    tokio::time::sleep(grace / 2).await;
    if !still_running() {
        return;
    }
    if let Err(source) = signal::kill(target, Signal::SIGKILL) {
        tracing::debug!(pid, %source, "SIGKILL delivery failed");
    }
}

/// Translate a `wait()`-reported termination into a returnCode convention:
/// the exit code on a normal exit, or the negated signal number on signal
/// termination.
#[cfg(unix)]
pub fn exit_status_to_return_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(code) = status.code() {
        code
    } else if let Some(signal) = status.signal() {
        -signal
    } else {
        -1
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
