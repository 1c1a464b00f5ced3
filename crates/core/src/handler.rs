// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! EventHandler: a `(matcher, body)` pair invoked during dispatch.

use crate::context::LaunchContext;
use crate::entity::Entity;
use crate::error::CoreError;
use crate::event::Event;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, pinned future — the concrete return type handler bodies must
/// produce. Exported so implementations outside this crate (e.g.
/// `launch-process`'s `ProcessAction` handlers) can annotate closure literals
/// with it, which is required for the closure-to-trait-object coercion to
/// type-check against [`HandlerFn`]'s higher-ranked signature.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Predicate tested against every event while this handler is registered.
pub type Matcher = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// The handler body. Takes ownership of the matched event (events are
/// immutable and cheap to clone, so handlers that need to keep a copy may
/// clone before passing it on) and returns any entities to visit next.
///
/// `context` arrives as `&Arc<LaunchContext>` rather than a bare reference so
/// a handler that needs to outlive the dispatch turn (spawning a background
/// task) can clone the `Arc` into it.
pub type HandlerFn = Arc<
    dyn for<'a> Fn(Event, &'a Arc<LaunchContext>) -> BoxFuture<'a, Result<Vec<Arc<dyn Entity>>, CoreError>>
        + Send
        + Sync,
>;

/// A registered `(matcher, handler)` pair.
///
/// `is_async`: handlers flagged async may suspend and are
/// routed to [`LaunchContext::register_async_event_handler`] instead of
/// [`LaunchContext::register_event_handler`]; synchronous handlers must not
/// suspend.
#[derive(Clone)]
pub struct EventHandler {
    pub matcher: Matcher,
    pub handler: HandlerFn,
    pub is_async: bool,
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler").field("is_async", &self.is_async).finish_non_exhaustive()
    }
}

impl EventHandler {
    pub fn new(matcher: Matcher, handler: HandlerFn) -> Self {
        Self { matcher, handler, is_async: false }
    }

    pub fn new_async(matcher: Matcher, handler: HandlerFn) -> Self {
        Self { matcher, handler, is_async: true }
    }

    pub fn matches(&self, event: &Event) -> bool {
        (self.matcher)(event)
    }
}

/// Matcher that matches events by their exact stable dotted name.
pub fn event_named(name: &'static str) -> Matcher {
    Arc::new(move |event: &Event| event.name() == name)
}

/// Matcher for the `ProcessIO` class hierarchy: `ProcessStdout`,
/// `ProcessStderr`, or `ProcessStdin`.
pub fn event_is_process_io() -> Matcher {
    Arc::new(|event: &Event| event.is_process_io())
}

/// Matcher that additionally requires the event's `action` field to equal a
/// specific [`crate::id::ActionId`].
pub fn event_for_action(base: Matcher, action: crate::id::ActionId) -> Matcher {
    Arc::new(move |event: &Event| base(event) && event.action() == Some(action))
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
