// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ProcessAction: the entity that spawns, supervises, and tears down one
//! child process.
//!
//! Spawn and pipe handling uses `tokio::process::Command` with
//! `Stdio::piped()`, streamed as a per-chunk reader rather than a single
//! captured buffer, so stdout/stderr become events as the child produces
//! them instead of only at exit.

use crate::signal::{self, escalate_shutdown};
use launch_core::{
    event_for_action, event_named, names, Action, ActionId, CoreError, Entity, Event, EventHandler,
    HandlerFn, LaunchContext, ProcessRecord, Substitution,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{mpsc, Notify};

const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);
const READ_CHUNK_SIZE: usize = 8192;

/// The one-time expansion of a [`ProcessAction`]'s templates, computed
/// during `execute` and then immutable.
#[derive(Debug, Clone)]
struct Resolved {
    cmd: Vec<String>,
    cwd: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

/// A description-tree entity that spawns and supervises one child process.
///
/// Construction takes the frozen templates (`cmd`/`cwd`/`env`/`shell`); the
/// templates are expanded exactly once, on the first `execute`. Visiting an
/// already-executed `ProcessAction` again spawns a second child — it is not
/// idempotent.
pub struct ProcessAction {
    id: ActionId,
    cmd_template: Vec<Vec<Arc<dyn Substitution>>>,
    cwd_template: Option<Vec<Arc<dyn Substitution>>>,
    env_template: Option<Vec<(Vec<Arc<dyn Substitution>>, Vec<Arc<dyn Substitution>>)>>,
    shell: bool,
    grace_period: Mutex<Duration>,
    resolved: Mutex<Option<Resolved>>,
}

impl fmt::Debug for ProcessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessAction")
            .field("id", &self.id)
            .field("shell", &self.shell)
            .field("resolved", &self.resolved.lock().is_some())
            .finish()
    }
}

impl ProcessAction {
    pub fn new(
        cmd: Vec<Vec<Arc<dyn Substitution>>>,
        cwd: Option<Vec<Arc<dyn Substitution>>>,
        env: Option<Vec<(Vec<Arc<dyn Substitution>>, Vec<Arc<dyn Substitution>>)>>,
        shell: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: ActionId::next(),
            cmd_template: cmd,
            cwd_template: cwd,
            env_template: env,
            shell,
            grace_period: Mutex::new(DEFAULT_GRACE_PERIOD),
            resolved: Mutex::new(None),
        })
    }

    /// Override the SIGINT→SIGTERM grace period used by the `ShutdownProcess`
    /// handler (defaults to 5s).
    pub fn set_grace_period(&self, grace_period: Duration) {
        *self.grace_period.lock() = grace_period;
    }

    /// Identity used by handler matchers and by callers composing
    /// `OnProcessExit`/`OnProcessIO` convenience handlers around this action.
    pub fn id(&self) -> ActionId {
        self.id
    }

    /// The expanded argv, once `execute` has run. Observable to callers but
    /// never mutated after first emission.
    pub fn resolved_cmd(&self) -> Option<Vec<String>> {
        self.resolved.lock().as_ref().map(|r| r.cmd.clone())
    }

    fn resolve(&self, context: &LaunchContext) -> Result<Resolved, CoreError> {
        let mut cmd = Vec::with_capacity(self.cmd_template.len());
        for element in &self.cmd_template {
            cmd.push(launch_core::resolve_concat(context, element)?);
        }
        let cwd = match &self.cwd_template {
            Some(parts) => Some(PathBuf::from(launch_core::resolve_concat(context, parts)?)),
            None => None,
        };
        let env = match &self.env_template {
            Some(pairs) => {
                let mut map = HashMap::with_capacity(pairs.len());
                for (key_parts, value_parts) in pairs {
                    let key = launch_core::resolve_concat(context, key_parts)?;
                    let value = launch_core::resolve_concat(context, value_parts)?;
                    map.insert(key, value);
                }
                Some(map)
            }
            None => None,
        };
        Ok(Resolved { cmd, cwd, env })
    }

    fn build_command(&self, resolved: &Resolved) -> Result<tokio::process::Command, CoreError> {
        if resolved.cmd.is_empty() {
            return Err(CoreError::InvalidEntity { detail: "ProcessAction cmd template resolved to zero arguments".into() });
        }

        let mut command = if self.shell {
            let mut c = tokio::process::Command::new("/bin/sh");
            c.arg("-c").arg(resolved.cmd.join(" "));
            c
        } else {
            let mut c = tokio::process::Command::new(&resolved.cmd[0]);
            c.args(&resolved.cmd[1..]);
            c
        };

        if let Some(cwd) = &resolved.cwd {
            command.current_dir(cwd);
        }
        if let Some(env) = &resolved.env {
            command.env_clear();
            command.envs(env);
        }
        if self.shell {
            command.process_group(0);
        }

        command.stdin(std::process::Stdio::piped());
        command.stdout(std::process::Stdio::piped());
        command.stderr(std::process::Stdio::piped());
        command.kill_on_drop(false);

        Ok(command)
    }

    /// Register the three per-action handlers. Each is filtered to events
    /// addressed to this action's [`ActionId`].
    fn register_handlers(&self, context: &Arc<LaunchContext>) -> [EventHandler; 3] {
        let id = self.id;
        let shell = self.shell;
        let grace_period = *self.grace_period.lock();

        let signal_handler: HandlerFn = Arc::new(
            move |event: Event, context: &Arc<LaunchContext>| -> launch_core::BoxFuture<'_, Result<Vec<Arc<dyn Entity>>, CoreError>> {
                Box::pin(async move {
                    let Event::SignalProcess { signal_number, .. } = event else {
                        return Ok(Vec::new());
                    };
                    if let Some(pid) = context.process_pid(id) {
                        if let Err(err) = signal::send_signal(pid, signal_number, shell) {
                            tracing::warn!(action = %id, error = %err, "signal delivery failed");
                        }
                    }
                    Ok(Vec::new())
                })
            },
        );

        let shutdown_handler: HandlerFn = Arc::new(
            move |_event: Event, context: &Arc<LaunchContext>| -> launch_core::BoxFuture<'_, Result<Vec<Arc<dyn Entity>>, CoreError>> {
                let context = context.clone();
                Box::pin(async move {
                    if let Some(pid) = context.process_pid(id) {
                        let ctx = context.clone();
                        escalate_shutdown(pid, shell, grace_period, move || ctx.is_process_live(id)).await;
                    }
                    Ok(Vec::new())
                })
            },
        );

        let stdin_handler: HandlerFn = Arc::new(
            move |event: Event, context: &Arc<LaunchContext>| -> launch_core::BoxFuture<'_, Result<Vec<Arc<dyn Entity>>, CoreError>> {
                Box::pin(async move {
                    let Event::ProcessStdin { text, .. } = event else {
                        return Ok(Vec::new());
                    };
                    match context.stdin_sender(id) {
                        Some(tx) => {
                            if tx.send(text.into_bytes()).is_err() {
                                tracing::debug!(action = %id, "stdin write dropped: child stdin already closed");
                            }
                        }
                        None => tracing::debug!(action = %id, "stdin write dropped: process not running"),
                    }
                    Ok(Vec::new())
                })
            },
        );

        let handlers = [
            EventHandler::new(event_for_action(event_named(names::SIGNAL_PROCESS), id), signal_handler),
            EventHandler::new_async(event_for_action(event_named(names::SHUTDOWN_PROCESS), id), shutdown_handler),
            EventHandler::new(event_for_action(event_named(names::PROCESS_STDIN), id), stdin_handler),
        ];
        for handler in &handlers {
            context.register_event_handler(handler.clone());
        }
        handlers
    }

    fn unregister_handlers(&self, context: &Arc<LaunchContext>, handlers: &[EventHandler; 3]) {
        for handler in handlers {
            context.unregister_event_handler(handler);
        }
    }
}

#[async_trait::async_trait]
impl Action for ProcessAction {
    async fn execute(&self, context: &Arc<LaunchContext>) -> Result<Vec<Arc<dyn Entity>>, CoreError> {
        let resolved = self.resolve(context)?;
        *self.resolved.lock() = Some(resolved.clone());

        let handlers = self.register_handlers(context);
        let mut command = self.build_command(&resolved)?;

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                tracing::warn!(action = %self.id, cmd = ?resolved.cmd, error = %source, "process spawn failed");
                self.unregister_handlers(context, &handlers);
                context.emit_event_sync(Event::ProcessExited {
                    action: self.id,
                    cmd: resolved.cmd,
                    cwd: resolved.cwd,
                    env: resolved.env,
                    return_code: source.raw_os_error().unwrap_or(-1),
                });
                return Ok(Vec::new());
            }
        };

        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdin = child.stdin.take();

        let (stdin_tx, stdin_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let exited = Arc::new(Notify::new());

        context.register_process(
            self.id,
            ProcessRecord { pid, stdin_tx, return_code: None, exited: exited.clone(), group: self.shell },
        );

        context.emit_event_sync(Event::ProcessStarted {
            action: self.id,
            cmd: resolved.cmd.clone(),
            cwd: resolved.cwd.clone(),
            env: resolved.env.clone(),
        });

        if let Some(stdin) = stdin {
            tokio::spawn(forward_stdin(stdin, stdin_rx));
        }
        let mut pump_handles = Vec::with_capacity(2);
        if let Some(stdout) = stdout {
            pump_handles.push(tokio::spawn(pump_output(context.clone(), self.id, resolved.clone(), stdout, false)));
        }
        if let Some(stderr) = stderr {
            pump_handles.push(tokio::spawn(pump_output(context.clone(), self.id, resolved.clone(), stderr, true)));
        }

        tokio::spawn(wait_for_exit(context.clone(), self.id, resolved, handlers, child, exited, pump_handles));

        Ok(Vec::new())
    }
}

async fn forward_stdin(mut stdin: tokio::process::ChildStdin, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(bytes) = rx.recv().await {
        if let Err(source) = stdin.write_all(&bytes).await {
            tracing::debug!(%source, "stdin forwarding write failed, child likely closed its stdin");
            break;
        }
    }
}

async fn pump_output<R>(
    context: Arc<LaunchContext>,
    action: ActionId,
    resolved: Resolved,
    mut reader: R,
    is_stderr: bool,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(source) => {
                tracing::debug!(action = %action, %source, "i/o error pumping child output, stopping pump");
                break;
            }
        };
        let chunk = buf[..n].to_vec();
        let event = if is_stderr {
            Event::ProcessStderr { action, cmd: resolved.cmd.clone(), cwd: resolved.cwd.clone(), env: resolved.env.clone(), text: chunk }
        } else {
            Event::ProcessStdout { action, cmd: resolved.cmd.clone(), cwd: resolved.cwd.clone(), env: resolved.env.clone(), text: chunk }
        };
        context.emit_event_sync(event);
    }
}

async fn wait_for_exit(
    context: Arc<LaunchContext>,
    action: ActionId,
    resolved: Resolved,
    handlers: [EventHandler; 3],
    mut child: tokio::process::Child,
    exited: Arc<Notify>,
    pump_handles: Vec<tokio::task::JoinHandle<()>>,
) {
    let return_code = match child.wait().await {
        Ok(status) => signal::exit_status_to_return_code(status),
        Err(source) => {
            tracing::warn!(action = %action, %source, "failed to wait on child process");
            -1
        }
    };

    // Wait for the stdout/stderr pumps to observe EOF and enqueue their last
    // chunk before emitting ProcessExited — otherwise a pump still draining
    // buffered pipe data could emit a ProcessStdout/ProcessStderr event after
    // ProcessExited.
    for handle in pump_handles {
        let _ = handle.await;
    }

    context.set_process_exit_code(action, return_code);
    context.emit_event_sync(Event::ProcessExited {
        action,
        cmd: resolved.cmd,
        cwd: resolved.cwd,
        env: resolved.env,
        return_code,
    });
    context.remove_process(action);
    exited.notify_waiters();

    for handler in &handlers {
        context.unregister_event_handler(handler);
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
