// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal built-in Entity/Action/EventHandler primitives needed to compose
//! descriptions ahead of a full description-builder collaborator:
//! `EmitEvent`, `RegisterEventHandler`, `UnregisterEventHandler`, `LogInfo`,
//! plus the `on_process_exit`/`on_process_io` convenience handler
//! constructors.

use launch_core::{
    event_for_action, event_is_process_io, event_named, names, Action, ActionId, BoxFuture,
    CoreError, Entity, Event, EventHandler, HandlerFn, LaunchContext, Substitution,
};
use std::sync::Arc;

/// Replays a fixed [`Event`] into the context when visited.
#[derive(Debug, Clone)]
pub struct EmitEvent {
    event: Event,
}

impl EmitEvent {
    pub fn new(event: Event) -> Arc<Self> {
        Arc::new(Self { event })
    }
}

#[async_trait::async_trait]
impl Action for EmitEvent {
    async fn execute(&self, context: &Arc<LaunchContext>) -> Result<Vec<Arc<dyn Entity>>, CoreError> {
        context.emit_event_sync(self.event.clone());
        Ok(Vec::new())
    }
}

/// Resolves a substitution sequence and logs it at `info` level via
/// `tracing`.
#[derive(Debug)]
pub struct LogInfo {
    parts: Vec<Arc<dyn Substitution>>,
}

impl LogInfo {
    pub fn new(parts: Vec<Arc<dyn Substitution>>) -> Arc<Self> {
        Arc::new(Self { parts })
    }
}

#[async_trait::async_trait]
impl Action for LogInfo {
    async fn execute(&self, context: &Arc<LaunchContext>) -> Result<Vec<Arc<dyn Entity>>, CoreError> {
        let text = launch_core::resolve_concat(context, &self.parts)?;
        tracing::info!(%text, "LogInfo");
        Ok(Vec::new())
    }
}

/// Registers a handler when visited, routing to the sync or async list per
/// the handler's own `is_async` flag.
#[derive(Debug, Clone)]
pub struct RegisterEventHandler {
    handler: EventHandler,
}

impl RegisterEventHandler {
    pub fn new(handler: EventHandler) -> Arc<Self> {
        Arc::new(Self { handler })
    }
}

#[async_trait::async_trait]
impl Action for RegisterEventHandler {
    async fn execute(&self, context: &Arc<LaunchContext>) -> Result<Vec<Arc<dyn Entity>>, CoreError> {
        if self.handler.is_async {
            context.register_async_event_handler(self.handler.clone());
        } else {
            context.register_event_handler(self.handler.clone());
        }
        Ok(Vec::new())
    }
}

/// Unregisters a previously-registered handler when visited (matched by
/// handler-body pointer identity, per `LaunchContext::unregister_event_handler`).
#[derive(Debug, Clone)]
pub struct UnregisterEventHandler {
    handler: EventHandler,
}

impl UnregisterEventHandler {
    pub fn new(handler: EventHandler) -> Arc<Self> {
        Arc::new(Self { handler })
    }
}

#[async_trait::async_trait]
impl Action for UnregisterEventHandler {
    async fn execute(&self, context: &Arc<LaunchContext>) -> Result<Vec<Arc<dyn Entity>>, CoreError> {
        context.unregister_event_handler(&self.handler);
        Ok(Vec::new())
    }
}

/// Convenience `EventHandler` constructor matching `ProcessExited` events for
/// one target action and visiting a fixed set of entities in response. The
/// callback overload is `on_process_exit_with`, below.
pub fn on_process_exit(target: ActionId, on_exit: Vec<Arc<dyn Entity>>) -> EventHandler {
    let matcher = event_for_action(event_named(names::PROCESS_EXITED), target);
    let handler: HandlerFn = Arc::new(move |_event: Event, _context: &Arc<LaunchContext>| -> BoxFuture<'_, Result<Vec<Arc<dyn Entity>>, CoreError>> {
        let on_exit = on_exit.clone();
        Box::pin(async move { Ok(on_exit) })
    });
    EventHandler::new(matcher, handler)
}

/// Convenience `EventHandler` constructor matching `ProcessExited` events for
/// one target action and computing the follow-on entities from the exit
/// code.
pub fn on_process_exit_with<F>(target: ActionId, on_exit: F) -> EventHandler
where
    F: Fn(i32) -> Vec<Arc<dyn Entity>> + Send + Sync + 'static,
{
    let matcher = event_for_action(event_named(names::PROCESS_EXITED), target);
    let on_exit = Arc::new(on_exit);
    let handler: HandlerFn = Arc::new(move |event: Event, _context: &Arc<LaunchContext>| -> BoxFuture<'_, Result<Vec<Arc<dyn Entity>>, CoreError>> {
        let on_exit = on_exit.clone();
        Box::pin(async move {
            let Event::ProcessExited { return_code, .. } = event else {
                return Ok(Vec::new());
            };
            Ok(on_exit(return_code))
        })
    });
    EventHandler::new(matcher, handler)
}

/// Per-stream callbacks for [`on_process_io`]; each receives the raw chunk
/// bytes and may return further entities to visit.
#[derive(Clone, Default)]
pub struct ProcessIoHandlers {
    pub on_stdin: Option<Arc<dyn Fn(&[u8]) -> Vec<Arc<dyn Entity>> + Send + Sync>>,
    pub on_stdout: Option<Arc<dyn Fn(&[u8]) -> Vec<Arc<dyn Entity>> + Send + Sync>>,
    pub on_stderr: Option<Arc<dyn Fn(&[u8]) -> Vec<Arc<dyn Entity>> + Send + Sync>>,
}

/// Convenience `EventHandler` constructor matching any `ProcessStdin` /
/// `ProcessStdout` / `ProcessStderr` event for one target action and
/// dispatching to the matching per-stream callback.
pub fn on_process_io(target: ActionId, handlers: ProcessIoHandlers) -> EventHandler {
    let matcher = event_for_action(event_is_process_io(), target);
    let handler: HandlerFn = Arc::new(move |event: Event, _context: &Arc<LaunchContext>| -> BoxFuture<'_, Result<Vec<Arc<dyn Entity>>, CoreError>> {
        let entities = match &event {
            Event::ProcessStdout { text, .. } => handlers.on_stdout.as_ref().map(|f| f(text)),
            Event::ProcessStderr { text, .. } => handlers.on_stderr.as_ref().map(|f| f(text)),
            Event::ProcessStdin { text, .. } => handlers.on_stdin.as_ref().map(|f| f(text.as_bytes())),
            _ => None,
        }
        .unwrap_or_default();
        Box::pin(async move { Ok(entities) })
    });
    EventHandler::new(matcher, handler)
}

#[cfg(test)]
#[path = "primitives_tests.rs"]
mod tests;
