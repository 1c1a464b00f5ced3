// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types for the launch runtime.
//!
//! A tagged enum with a stable dotted `name()`, not `Serialize` — the
//! core has no wire or persistence concern, and several variants carry
//! `Arc<dyn Entity>` trees that don't serialize.

use crate::entity::LaunchDescription;
use crate::id::ActionId;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Events that flow through a [`crate::context::LaunchContext`]'s queue.
///
/// Immutable once constructed — enqueued payloads are never mutated, which
/// this upholds by never exposing `&mut` accessors.
#[derive(Debug, Clone)]
pub enum Event {
    /// Evaluate a given [`LaunchDescription`] and visit all of its entities.
    IncludeLaunchDescription { description: Arc<LaunchDescription> },

    /// Stop the event loop and tear down all live processes.
    Shutdown { reason: String },

    /// Request graceful termination of one child (SIGINT → SIGTERM → SIGKILL).
    ShutdownProcess { action: ActionId },

    /// Request signal delivery to one child.
    SignalProcess { action: ActionId, signal_number: i32 },

    /// Data to write to a child's stdin.
    ProcessStdin { action: ActionId, text: String },

    ProcessStarted {
        action: ActionId,
        cmd: Vec<String>,
        cwd: Option<PathBuf>,
        env: Option<HashMap<String, String>>,
    },

    ProcessExited {
        action: ActionId,
        cmd: Vec<String>,
        cwd: Option<PathBuf>,
        env: Option<HashMap<String, String>>,
        return_code: i32,
    },

    ProcessStdout {
        action: ActionId,
        cmd: Vec<String>,
        cwd: Option<PathBuf>,
        env: Option<HashMap<String, String>>,
        text: Vec<u8>,
    },

    ProcessStderr {
        action: ActionId,
        cmd: Vec<String>,
        cwd: Option<PathBuf>,
        env: Option<HashMap<String, String>>,
        text: Vec<u8>,
    },
}

/// Stable dotted event names, exposed as constants so
/// matcher-construction call sites don't re-type string literals.
pub mod names {
    pub const INCLUDE_LAUNCH_DESCRIPTION: &str = "launch.events.IncludeLaunchDescription";
    pub const SHUTDOWN: &str = "launch.events.Shutdown";
    pub const SHUTDOWN_PROCESS: &str = "launch.events.process.ShutdownProcess";
    pub const SIGNAL_PROCESS: &str = "launch.events.process.SignalProcess";
    pub const PROCESS_STDIN: &str = "launch.events.process.ProcessStdin";
    pub const PROCESS_STARTED: &str = "launch.events.process.ProcessStarted";
    pub const PROCESS_EXITED: &str = "launch.events.process.ProcessExited";
    pub const PROCESS_STDOUT: &str = "launch.events.process.ProcessStdout";
    pub const PROCESS_STDERR: &str = "launch.events.process.ProcessStderr";
}

impl Event {
    /// Stable dotted name, used as the default matcher key.
    /// Renaming these breaks user matchers — treat as a public API surface.
    pub fn name(&self) -> &'static str {
        match self {
            Event::IncludeLaunchDescription { .. } => names::INCLUDE_LAUNCH_DESCRIPTION,
            Event::Shutdown { .. } => names::SHUTDOWN,
            Event::ShutdownProcess { .. } => names::SHUTDOWN_PROCESS,
            Event::SignalProcess { .. } => names::SIGNAL_PROCESS,
            Event::ProcessStdin { .. } => names::PROCESS_STDIN,
            Event::ProcessStarted { .. } => names::PROCESS_STARTED,
            Event::ProcessExited { .. } => names::PROCESS_EXITED,
            Event::ProcessStdout { .. } => names::PROCESS_STDOUT,
            Event::ProcessStderr { .. } => names::PROCESS_STDERR,
        }
    }

    /// The [`ActionId`] a process-related event pertains to, if any.
    pub fn action(&self) -> Option<ActionId> {
        match self {
            Event::ShutdownProcess { action }
            | Event::SignalProcess { action, .. }
            | Event::ProcessStdin { action, .. }
            | Event::ProcessStarted { action, .. }
            | Event::ProcessExited { action, .. }
            | Event::ProcessStdout { action, .. }
            | Event::ProcessStderr { action, .. } => Some(*action),
            Event::IncludeLaunchDescription { .. } | Event::Shutdown { .. } => None,
        }
    }

    /// True for `ProcessStdout` / `ProcessStderr` / `ProcessStdin` — lets an
    /// `OnProcessIO`-style matcher group all three without a name-prefix
    /// test or an explicit `Kind` field.
    pub fn is_process_io(&self) -> bool {
        matches!(self, Event::ProcessStdout { .. } | Event::ProcessStderr { .. } | Event::ProcessStdin { .. })
    }

    pub fn log_summary(&self) -> String {
        match self {
            Event::IncludeLaunchDescription { description } => {
                format!("{} entities={}", self.name(), description.entities.len())
            }
            Event::Shutdown { reason } => format!("{} reason={reason}", self.name()),
            Event::ShutdownProcess { action } => format!("{} action={action}", self.name()),
            Event::SignalProcess { action, signal_number } => {
                format!("{} action={action} signal={signal_number}", self.name())
            }
            Event::ProcessStdin { action, text } => {
                format!("{} action={action} bytes={}", self.name(), text.len())
            }
            Event::ProcessStarted { action, cmd, .. } => {
                format!("{} action={action} cmd={cmd:?}", self.name())
            }
            Event::ProcessExited { action, return_code, .. } => {
                format!("{} action={action} return_code={return_code}", self.name())
            }
            Event::ProcessStdout { action, text, .. } | Event::ProcessStderr { action, text, .. } => {
                format!("{} action={action} bytes={}", self.name(), text.len())
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
