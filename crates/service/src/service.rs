// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LaunchService: owns the context, drives the loop, tears down on exit.
//!
//! Holds its `Arc<LaunchContext>` plus an `AtomicBool` running-flag so
//! `run` can be guarded against concurrent re-entry from multiple threads.

use crate::error::ServiceError;
use launch_core::{
    event_named, names, BoxFuture, CoreError, Entity, Event, EventHandler, HandlerFn,
    LaunchContext, LaunchDescription,
};
use launch_process::signal::escalate_shutdown;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Grace period `teardown` waits for SIGINT before escalating to SIGTERM for
/// each live process, independent of any single `ProcessAction`'s own
/// per-action grace period.
const TEARDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Upper bound on how long `teardown` waits for `ProcessExited` events to
/// drain after signaling every live child, so a child that refuses to die
/// even to SIGKILL cannot hang `run` forever.
const TEARDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns a [`LaunchContext`], drives its dispatch loop to completion, and
/// tears down any still-live children before `run` returns.
pub struct LaunchService {
    context: Arc<LaunchContext>,
    running: AtomicBool,
}

impl Default for LaunchService {
    fn default() -> Self {
        Self::new()
    }
}

impl LaunchService {
    pub fn new() -> Self {
        Self { context: Arc::new(LaunchContext::new()), running: AtomicBool::new(false) }
    }

    /// The underlying context, for callers composing handlers/actions ahead
    /// of or during `run`.
    pub fn context(&self) -> &Arc<LaunchContext> {
        &self.context
    }

    /// True while a `run` call is in progress. Safe to poll from any thread.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Visit `description` once the loop reaches it. Safe to call from any
    /// thread, before or during `run`.
    pub fn include_launch_description(&self, description: Arc<LaunchDescription>) {
        self.context.emit_event_sync(Event::IncludeLaunchDescription { description });
    }

    /// Stop the loop from another thread. Idempotent — emitting `Shutdown`
    /// after the loop has already stopped is simply dropped.
    pub fn shutdown(&self, reason: impl Into<String>) {
        self.context.emit_event_sync(Event::Shutdown { reason: reason.into() });
    }

    /// Drive the event loop until `Shutdown` is processed or the queue
    /// drains with no live children, then tear down any remaining
    /// processes. Returns 0 on clean completion, non-zero if a handler
    /// raised during dispatch.
    pub async fn run(&self) -> Result<i32, ServiceError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::AlreadyRunning);
        }
        let result = self.run_inner().await;
        self.running.store(false, Ordering::SeqCst);
        Ok(result)
    }

    async fn run_inner(&self) -> i32 {
        // `IncludeLaunchDescription` is wired through the same generic
        // matcher/handler dispatch as any other event: this handler's only
        // job is to hand the description back as a child entity so the
        // existing `visit_recursive` machinery in `LaunchContext::dispatch`
        // visits it (and everything it in turn returns) within the same
        // dispatch turn.
        let on_include: HandlerFn = Arc::new(
            move |event: Event, _context: &Arc<LaunchContext>| -> BoxFuture<'_, Result<Vec<Arc<dyn Entity>>, CoreError>> {
                Box::pin(async move {
                    let Event::IncludeLaunchDescription { description } = event else {
                        return Ok(Vec::new());
                    };
                    Ok(vec![description as Arc<dyn Entity>])
                })
            },
        );
        let include_handler = EventHandler::new(event_named(names::INCLUDE_LAUNCH_DESCRIPTION), on_include);
        self.context.register_event_handler(include_handler.clone());

        let shutdown_requested = Arc::new(AtomicBool::new(false));
        let flag = shutdown_requested.clone();
        let on_shutdown: HandlerFn = Arc::new(
            move |_event: Event, _context: &Arc<LaunchContext>| -> BoxFuture<'_, Result<Vec<Arc<dyn Entity>>, CoreError>> {
                flag.store(true, Ordering::SeqCst);
                Box::pin(async { Ok(Vec::new()) })
            },
        );
        let shutdown_handler = EventHandler::new(event_named(names::SHUTDOWN), on_shutdown);
        self.context.register_event_handler(shutdown_handler.clone());

        let mut exit_code = 0;
        loop {
            if let Err(err) = self.context.process_one_event().await {
                tracing::error!(error = %err, "event handler failed; triggering shutdown");
                self.context.emit_event_sync(Event::Shutdown { reason: format!("handler failure: {err}") });
                exit_code = 1;
                break;
            }
            if shutdown_requested.load(Ordering::SeqCst) {
                break;
            }
            if self.context.queue_is_empty() && self.context.live_process_ids().is_empty() {
                break;
            }
        }

        self.context.unregister_event_handler(&shutdown_handler);
        self.context.unregister_event_handler(&include_handler);
        self.teardown().await;
        exit_code
    }

    /// Best-effort SIGINT → SIGTERM → SIGKILL every live process-table
    /// entry concurrently, then drain the `ProcessExited` events their own
    /// `wait_for_exit` tasks emit, so `run` never returns while a child it
    /// spawned is still alive.
    ///
    /// Signals the process table directly via `launch_process::signal`
    /// rather than emitting `ShutdownProcess` per action: the latter would
    /// serialize every child's grace period behind the dispatch loop's
    /// one-event-at-a-time processing, needlessly delaying teardown when
    /// multiple children are shutting down at once.
    async fn teardown(&self) {
        let live = self.context.live_process_ids();
        if live.is_empty() {
            return;
        }
        tracing::debug!(count = live.len(), "terminating live processes at shutdown");

        let mut waiters = Vec::with_capacity(live.len());
        for action in live {
            let Some(pid) = self.context.process_pid(action) else { continue };
            let group = self.context.process_group(action).unwrap_or(false);
            let ctx = self.context.clone();
            waiters.push(tokio::spawn(async move {
                escalate_shutdown(pid, group, TEARDOWN_GRACE_PERIOD, move || ctx.is_process_live(action)).await;
            }));
        }
        for waiter in waiters {
            let _ = waiter.await;
        }

        // Drain on the queue, not the process table: `wait_for_exit` emits
        // `ProcessExited` and removes the table entry in the same breath, so
        // by the time the escalation tasks above have all returned the table
        // is already empty — dispatching on table emptiness would skip over
        // the queued exit events instead of delivering them to handlers.
        let deadline = tokio::time::Instant::now() + TEARDOWN_DRAIN_TIMEOUT;
        while !self.context.queue_is_empty() {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                tracing::warn!("teardown timed out waiting for ProcessExited events to drain");
                break;
            }
            if tokio::time::timeout(remaining, self.context.process_one_event()).await.is_err() {
                tracing::warn!("teardown timed out waiting for ProcessExited events to drain");
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
