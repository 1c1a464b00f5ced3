use super::*;
use launch_core::{EventHandler, HandlerFn, LaunchContext, LaunchDescription, Matcher};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

fn capture_handler(log: Arc<StdMutex<Vec<Event>>>) -> HandlerFn {
    Arc::new(move |event: Event, _ctx: &Arc<LaunchContext>| -> launch_core::BoxFuture<'_, Result<Vec<Arc<dyn Entity>>, CoreError>> {
        let log = log.clone();
        Box::pin(async move {
            log.lock().unwrap().push(event);
            Ok(Vec::new())
        })
    })
}

fn match_all() -> Matcher {
    Arc::new(|_event: &Event| true)
}

async fn drive_until(ctx: &Arc<LaunchContext>, log: &Arc<StdMutex<Vec<Event>>>, name: &'static str, max_events: usize) {
    for _ in 0..max_events {
        tokio::time::timeout(Duration::from_secs(5), ctx.process_one_event())
            .await
            .expect("event loop stalled")
            .unwrap();
        if log.lock().unwrap().iter().any(|e| e.name() == name) {
            return;
        }
    }
    panic!("expected event {name} not observed within {max_events} events");
}

fn literal_cmd(parts: &[&str]) -> Vec<Vec<Arc<dyn launch_core::Substitution>>> {
    parts.iter().map(|p| vec![launch_core::Literal::new(*p)]).collect()
}

#[tokio::test]
async fn echo_produces_started_stdout_and_exited_in_order() {
    let ctx = Arc::new(LaunchContext::new());
    let log = Arc::new(StdMutex::new(Vec::new()));
    ctx.register_event_handler(EventHandler::new(match_all(), capture_handler(log.clone())));

    let action = ProcessAction::new(literal_cmd(&["/bin/echo", "hi"]), None, None, false);
    let description = LaunchDescription::new(vec![action.clone()]);
    ctx.emit_event_sync(Event::IncludeLaunchDescription { description: Arc::new(description) });

    drive_until(&ctx, &log, "launch.events.process.ProcessExited", 32).await;

    let events = log.lock().unwrap();
    let started = events.iter().position(|e| e.name() == "launch.events.process.ProcessStarted").unwrap();
    let exited = events.iter().position(|e| e.name() == "launch.events.process.ProcessExited").unwrap();
    assert!(started < exited);

    let stdout: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            Event::ProcessStdout { text, .. } => Some(text.clone()),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(stdout, b"hi\n");

    let Event::ProcessExited { return_code, .. } = &events[exited] else { unreachable!() };
    assert_eq!(*return_code, 0);

    assert_eq!(action.resolved_cmd().unwrap(), vec!["/bin/echo".to_string(), "hi".to_string()]);
}

#[tokio::test]
async fn substitution_failure_aborts_before_spawn() {
    let ctx = Arc::new(LaunchContext::new());
    std::env::remove_var("LAUNCH_PROCESS_TEST_UNSET_VAR");
    let cmd = vec![vec![launch_core::EnvVar::new("LAUNCH_PROCESS_TEST_UNSET_VAR")]];
    let action = ProcessAction::new(cmd, None, None, false);

    let err = action.execute(&ctx).await.unwrap_err();
    assert!(matches!(err, CoreError::Substitution(_)));
    assert!(action.resolved_cmd().is_none());
}

#[tokio::test]
async fn stdin_passthrough_reaches_cat_before_shutdown() {
    let ctx = Arc::new(LaunchContext::new());
    let log = Arc::new(StdMutex::new(Vec::new()));
    ctx.register_event_handler(EventHandler::new(match_all(), capture_handler(log.clone())));

    let action = ProcessAction::new(literal_cmd(&["/bin/cat"]), None, None, false);
    let id = action.id();
    let description = LaunchDescription::new(vec![action]);
    ctx.emit_event_sync(Event::IncludeLaunchDescription { description: Arc::new(description) });

    drive_until(&ctx, &log, "launch.events.process.ProcessStarted", 8).await;

    ctx.emit_event_sync(Event::ProcessStdin { action: id, text: "hello\n".into() });
    ctx.emit_event_sync(Event::ShutdownProcess { action: id });

    drive_until(&ctx, &log, "launch.events.process.ProcessExited", 32).await;

    let events = log.lock().unwrap();
    let stdout: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            Event::ProcessStdout { text, .. } => Some(text.clone()),
            _ => None,
        })
        .flatten()
        .collect();
    assert!(String::from_utf8_lossy(&stdout).contains("hello"));
}

#[tokio::test]
async fn cwd_template_resolves_before_spawn_and_the_child_inherits_it() {
    let ctx = Arc::new(LaunchContext::new());
    let log = Arc::new(StdMutex::new(Vec::new()));
    ctx.register_event_handler(EventHandler::new(match_all(), capture_handler(log.clone())));

    let dir = tempfile::tempdir().unwrap();
    let canonical = dir.path().canonicalize().unwrap();
    let cwd = vec![launch_core::Literal::new(canonical.to_string_lossy().to_string())];

    let action = ProcessAction::new(literal_cmd(&["/bin/pwd"]), Some(cwd), None, false);
    let description = LaunchDescription::new(vec![action]);
    ctx.emit_event_sync(Event::IncludeLaunchDescription { description: Arc::new(description) });

    drive_until(&ctx, &log, "launch.events.process.ProcessExited", 32).await;

    let events = log.lock().unwrap();
    let stdout: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            Event::ProcessStdout { text, .. } => Some(text.clone()),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(String::from_utf8_lossy(&stdout).trim(), canonical.to_string_lossy());
}

#[tokio::test]
async fn signal_process_delivers_sigterm_to_a_running_sleep() {
    let ctx = Arc::new(LaunchContext::new());
    let log = Arc::new(StdMutex::new(Vec::new()));
    ctx.register_event_handler(EventHandler::new(match_all(), capture_handler(log.clone())));

    let action = ProcessAction::new(literal_cmd(&["/bin/sleep", "60"]), None, None, false);
    let id = action.id();
    let description = LaunchDescription::new(vec![action]);
    ctx.emit_event_sync(Event::IncludeLaunchDescription { description: Arc::new(description) });

    drive_until(&ctx, &log, "launch.events.process.ProcessStarted", 8).await;
    ctx.emit_event_sync(Event::SignalProcess { action: id, signal_number: 15 });

    drive_until(&ctx, &log, "launch.events.process.ProcessExited", 32).await;

    let events = log.lock().unwrap();
    let Event::ProcessExited { return_code, .. } =
        events.iter().find(|e| e.name() == "launch.events.process.ProcessExited").unwrap()
    else {
        unreachable!()
    };
    assert_eq!(*return_code, -15);
}
