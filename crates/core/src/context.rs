// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LaunchContext: process-wide runtime state.
//!
//! Owns the event queue, handler deques, and dispatch loop behind
//! `parking_lot::Mutex`-guarded shared state so it can be driven
//! concurrently from multiple tasks instead of assuming a single thread.
//! The queue receiver alone uses a `tokio::sync::Mutex`, since its guard is
//! held across the suspending `recv().await` in `process_one_event`.

use crate::entity::visit_recursive;
use crate::error::{CoreError, SubstitutionError};
use crate::event::Event;
use crate::handler::EventHandler;
use crate::id::ActionId;
use crate::substitution::Substitution;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex as AsyncMutex, Notify};

/// Live child-process bookkeeping, keyed by [`ActionId`] in
/// [`LaunchContext`]'s process table.
///
/// Exists from just before `ProcessStarted` is emitted until just after
/// `ProcessExited` is emitted.
pub struct ProcessRecord {
    pub pid: Option<u32>,
    pub stdin_tx: mpsc::UnboundedSender<Vec<u8>>,
    pub return_code: Option<i32>,
    pub exited: Arc<Notify>,
    /// Whether signals targeting this process should go to its process
    /// group (`shell=true` actions become their own group leader) rather
    /// than the bare PID.
    pub group: bool,
}

/// Runtime context owning the event queue, handler registry, and process
/// table — shared via `Arc` between the dispatch loop and any concurrently
/// running `ProcessAction` tasks.
pub struct LaunchContext {
    queue_tx: mpsc::UnboundedSender<Event>,
    queue_rx: AsyncMutex<mpsc::UnboundedReceiver<Event>>,
    handlers: Mutex<VecDeque<EventHandler>>,
    async_handlers: Mutex<VecDeque<EventHandler>>,
    processes: Mutex<HashMap<ActionId, ProcessRecord>>,
    /// Count of events sent but not yet dequeued by `process_one_event`.
    /// Lets `LaunchService::run` detect "queue drains with no live
    /// children" without consuming from the channel.
    queue_depth: AtomicUsize,
}

impl std::fmt::Debug for LaunchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchContext")
            .field("handlers", &self.handlers.lock().len())
            .field("processes", &self.processes.lock().len())
            .finish()
    }
}

impl Default for LaunchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl LaunchContext {
    pub fn new() -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Self {
            queue_tx,
            queue_rx: AsyncMutex::new(queue_rx),
            handlers: Mutex::new(VecDeque::new()),
            async_handlers: Mutex::new(VecDeque::new()),
            processes: Mutex::new(HashMap::new()),
            queue_depth: AtomicUsize::new(0),
        }
    }

    /// Prepend a synchronous handler. No deduplication; registering the same
    /// handler twice makes it fire twice per matching event.
    pub fn register_event_handler(&self, handler: EventHandler) {
        self.handlers.lock().push_front(handler);
    }

    /// Prepend a handler whose body may suspend.
    pub fn register_async_event_handler(&self, handler: EventHandler) {
        self.async_handlers.lock().push_front(handler);
    }

    /// Remove the first occurrence of a handler matching by pointer identity
    /// of its handler body, from whichever list it was registered in
    /// (`is_async` only selects where registration puts a handler, not where
    /// removal looks). No-op if absent.
    pub fn unregister_event_handler(&self, handler: &EventHandler) {
        let mut handlers = self.handlers.lock();
        if let Some(pos) = handlers.iter().position(|h| Arc::ptr_eq(&h.handler, &handler.handler)) {
            handlers.remove(pos);
            return;
        }
        drop(handlers);
        let mut async_handlers = self.async_handlers.lock();
        if let Some(pos) = async_handlers.iter().position(|h| Arc::ptr_eq(&h.handler, &handler.handler)) {
            async_handlers.remove(pos);
        }
    }

    /// Non-blocking enqueue. Safe from any thread or handler.
    pub fn emit_event_sync(&self, event: Event) {
        tracing::debug!(event = %event.log_summary(), "emitting event synchronously");
        // An unbounded channel's `send` never actually blocks; a dropped
        // receiver (context torn down) just means the event is discarded.
        if self.queue_tx.send(event).is_ok() {
            self.queue_depth.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Suspending enqueue. With the unbounded channel used here this never
    /// actually suspends, making it behaviorally equivalent to
    /// `emit_event_sync` — but keeps the distinct async signature so a
    /// bounded-queue variant only needs to change the channel.
    pub async fn emit_event(&self, event: Event) {
        tracing::debug!(event = %event.log_summary(), "emitting event");
        if self.queue_tx.send(event).is_ok() {
            self.queue_depth.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn perform_substitution(&self, sub: &dyn Substitution) -> Result<String, SubstitutionError> {
        sub.resolve(self)
    }

    /// Dequeue one event and dispatch it, including recursive visits of any
    /// entities handlers return. Returns when dispatch is fully complete.
    pub async fn process_one_event(self: &Arc<Self>) -> Result<(), CoreError> {
        let event = {
            let mut rx = self.queue_rx.lock().await;
            rx.recv().await
        };
        let Some(event) = event else {
            return Ok(());
        };
        self.queue_depth.fetch_sub(1, Ordering::SeqCst);
        self.dispatch(event).await
    }

    /// True when no events are sitting in the queue waiting to be dequeued.
    /// Consulted by `LaunchService::run`'s "queue drains with no live
    /// children" termination check; never consumes from the channel.
    pub fn queue_is_empty(&self) -> bool {
        self.queue_depth.load(Ordering::SeqCst) == 0
    }

    async fn dispatch(self: &Arc<Self>, event: Event) -> Result<(), CoreError> {
        tracing::debug!(event = %event.log_summary(), "dispatching event");

        // Snapshot before iterating: handlers registered during this turn's
        // dispatch must not fire for the current event.
        let snapshot: Vec<EventHandler> = self.handlers.lock().iter().cloned().collect();
        let async_snapshot: Vec<EventHandler> = self.async_handlers.lock().iter().cloned().collect();

        for handler in snapshot.iter().chain(async_snapshot.iter()) {
            if !handler.matches(&event) {
                continue;
            }
            let children = (handler.handler)(event.clone(), self).await?;
            for child in &children {
                visit_recursive(child.as_ref(), self).await?;
            }
        }
        Ok(())
    }

    // -- process table -----------------------------------------------------

    pub fn register_process(&self, action: ActionId, record: ProcessRecord) {
        self.processes.lock().insert(action, record);
    }

    pub fn remove_process(&self, action: ActionId) -> Option<ProcessRecord> {
        self.processes.lock().remove(&action)
    }

    pub fn set_process_exit_code(&self, action: ActionId, code: i32) {
        if let Some(record) = self.processes.lock().get_mut(&action) {
            record.return_code = Some(code);
        }
    }

    pub fn stdin_sender(&self, action: ActionId) -> Option<mpsc::UnboundedSender<Vec<u8>>> {
        self.processes.lock().get(&action).map(|r| r.stdin_tx.clone())
    }

    pub fn process_pid(&self, action: ActionId) -> Option<u32> {
        self.processes.lock().get(&action).and_then(|r| r.pid)
    }

    /// Whether signals to this action should target its process group
    /// rather than its bare PID. `None` if the action is not live.
    pub fn process_group(&self, action: ActionId) -> Option<bool> {
        self.processes.lock().get(&action).map(|r| r.group)
    }

    /// All currently-live action ids, oldest registration order not
    /// guaranteed — used by teardown, which signals every live child
    /// without caring about order.
    pub fn live_process_ids(&self) -> Vec<ActionId> {
        self.processes.lock().keys().copied().collect()
    }

    pub fn is_process_live(&self, action: ActionId) -> bool {
        self.processes.lock().contains_key(&action)
    }

    pub fn process_exited_signal(&self, action: ActionId) -> Option<Arc<Notify>> {
        self.processes.lock().get(&action).map(|r| r.exited.clone())
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
