use super::*;
use crate::id::ActionId;

fn sample_action() -> ActionId {
    ActionId::next()
}

#[test]
fn names_are_stable_dotted_strings() {
    let action = sample_action();
    assert_eq!(Event::Shutdown { reason: "done".into() }.name(), "launch.events.Shutdown");
    assert_eq!(Event::ShutdownProcess { action }.name(), "launch.events.process.ShutdownProcess");
    assert_eq!(
        Event::SignalProcess { action, signal_number: 15 }.name(),
        "launch.events.process.SignalProcess"
    );
}

#[test]
fn process_events_report_their_action() {
    let action = sample_action();
    let event = Event::ProcessStarted { action, cmd: vec!["echo".into()], cwd: None, env: None };
    assert_eq!(event.action(), Some(action));
}

#[test]
fn non_process_events_have_no_action() {
    assert_eq!(Event::Shutdown { reason: "x".into() }.action(), None);
    assert_eq!(
        Event::IncludeLaunchDescription { description: Arc::new(LaunchDescription::default()) }.action(),
        None
    );
}

#[test]
fn is_process_io_covers_exactly_stdin_stdout_stderr() {
    let action = sample_action();
    assert!(Event::ProcessStdin { action, text: "x".into() }.is_process_io());
    assert!(Event::ProcessStdout { action, cmd: vec![], cwd: None, env: None, text: vec![] }.is_process_io());
    assert!(Event::ProcessStderr { action, cmd: vec![], cwd: None, env: None, text: vec![] }.is_process_io());
    assert!(!Event::ShutdownProcess { action }.is_process_io());
    assert!(!Event::Shutdown { reason: "x".into() }.is_process_io());
}

#[test]
fn log_summary_includes_action_and_name() {
    let action = sample_action();
    let summary = Event::ProcessExited {
        action,
        cmd: vec!["true".into()],
        cwd: None,
        env: None,
        return_code: 0,
    }
    .log_summary();
    assert!(summary.contains("ProcessExited"));
    assert!(summary.contains(&action.to_string()));
    assert!(summary.contains("return_code=0"));
}

#[test]
fn clone_is_a_deep_value_copy_not_an_alias() {
    let action = sample_action();
    let original = Event::ProcessStdin { action, text: "abc".into() };
    let cloned = original.clone();
    assert_eq!(original.name(), cloned.name());
    assert_eq!(original.action(), cloned.action());
}
