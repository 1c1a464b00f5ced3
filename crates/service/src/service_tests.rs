use super::*;
use launch_core::{EnvVar, Literal, Substitution};
use launch_process::ProcessAction;
use std::time::Duration;

fn literal_cmd(parts: &[&str]) -> Vec<Vec<Arc<dyn Substitution>>> {
    parts.iter().map(|p| vec![Literal::new(*p)]).collect()
}

#[tokio::test]
async fn run_drains_after_an_included_process_exits() {
    let service = LaunchService::new();
    let action = ProcessAction::new(literal_cmd(&["/bin/echo", "hi"]), None, None, false);
    let description = Arc::new(LaunchDescription::new(vec![action]));
    service.include_launch_description(description);

    let code = tokio::time::timeout(Duration::from_secs(10), service.run()).await.unwrap().unwrap();

    assert_eq!(code, 0);
    assert!(!service.is_running());
    assert!(service.context().live_process_ids().is_empty());
}

#[tokio::test]
async fn shutdown_from_another_task_terminates_live_children() {
    let service = Arc::new(LaunchService::new());
    let a = ProcessAction::new(literal_cmd(&["/bin/sleep", "60"]), None, None, false);
    let b = ProcessAction::new(literal_cmd(&["/bin/sleep", "60"]), None, None, false);
    let description = Arc::new(LaunchDescription::new(vec![a, b]));
    service.include_launch_description(description);

    let svc = service.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        svc.shutdown("stop");
    });

    let code = tokio::time::timeout(Duration::from_secs(20), service.run()).await.unwrap().unwrap();

    assert_eq!(code, 0);
    assert!(service.context().live_process_ids().is_empty());
}

#[tokio::test]
async fn running_twice_concurrently_rejects_the_second_call() {
    let service = Arc::new(LaunchService::new());
    let action = ProcessAction::new(literal_cmd(&["/bin/sleep", "60"]), None, None, false);
    let description = Arc::new(LaunchDescription::new(vec![action]));
    service.include_launch_description(description);

    let svc = service.clone();
    let first = tokio::spawn(async move { svc.run().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(service.is_running());

    let second = service.run().await;
    assert!(matches!(second, Err(ServiceError::AlreadyRunning)));

    service.shutdown("stop");
    let code = tokio::time::timeout(Duration::from_secs(20), first).await.unwrap().unwrap().unwrap();
    assert_eq!(code, 0);
}

#[tokio::test]
async fn a_failing_substitution_returns_a_non_zero_exit_code() {
    let service = LaunchService::new();
    std::env::remove_var("LAUNCH_SERVICE_TEST_UNSET_VAR");
    let action = ProcessAction::new(vec![vec![EnvVar::new("LAUNCH_SERVICE_TEST_UNSET_VAR")]], None, None, false);
    let description = Arc::new(LaunchDescription::new(vec![action]));
    service.include_launch_description(description);

    let code = tokio::time::timeout(Duration::from_secs(10), service.run()).await.unwrap().unwrap();

    assert_eq!(code, 1);
}
