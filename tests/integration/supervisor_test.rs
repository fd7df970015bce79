#![cfg(unix)]

use crate::{init_tracing, StubBins, ENGINE_SLEEP};
use ferrobench_core::{Readiness, TeardownOutcome, WorkerHandle, WorkerRole};
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_sigterm_ignoring_worker_is_force_killed_within_window() {
    init_tracing();
    let stubs = StubBins::new();
    // Ignores the graceful request outright.
    let stubborn = stubs.write("stubborn", "trap '' TERM\nsleep 30 &\nwait");

    let cmd = vec![stubborn.display().to_string()];
    let mut handle = WorkerHandle::spawn(&cmd, WorkerRole::Server, 20000).unwrap();
    handle
        .await_ready(&Readiness::Settle(Duration::from_millis(50)))
        .await
        .unwrap();

    let grace = Duration::from_millis(300);
    let start = Instant::now();
    let outcome = handle.teardown(grace).await;

    assert_eq!(outcome, TeardownOutcome::Forced);
    // Grace plus the kill itself, with generous slack for a loaded machine.
    assert!(start.elapsed() < grace + Duration::from_secs(2));
}

#[tokio::test]
async fn test_cooperative_worker_terminates_gracefully() {
    init_tracing();
    let stubs = StubBins::new();
    let worker = stubs.write("worker", ENGINE_SLEEP);

    let cmd = vec![worker.display().to_string()];
    let mut handle = WorkerHandle::spawn(&cmd, WorkerRole::Client, 15000).unwrap();
    handle
        .await_ready(&Readiness::Settle(Duration::from_millis(50)))
        .await
        .unwrap();

    let outcome = handle.teardown(Duration::from_secs(2)).await;
    assert_eq!(outcome, TeardownOutcome::Graceful);
}

#[tokio::test]
async fn test_early_exit_surfaces_captured_stderr() {
    init_tracing();
    let stubs = StubBins::new();
    let dying = stubs.write("dying", "echo 'bind: address in use' >&2\nexit 1");

    let cmd = vec![dying.display().to_string()];
    let mut handle = WorkerHandle::spawn(&cmd, WorkerRole::Client, 15000).unwrap();
    let err = handle
        .await_ready(&Readiness::Settle(Duration::from_millis(50)))
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("client"), "missing role in: {msg}");
    assert!(msg.contains("bind: address in use"), "missing stderr in: {msg}");

    assert_eq!(handle.teardown(Duration::from_secs(1)).await, TeardownOutcome::AlreadyExited);
}

#[tokio::test]
async fn test_probe_readiness_connects_to_listener() {
    init_tracing();
    let stubs = StubBins::new();
    let worker = stubs.write("worker", ENGINE_SLEEP);

    // The stub never listens; stand in for its listener from the test.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let cmd = vec![worker.display().to_string()];
    let mut handle = WorkerHandle::spawn(&cmd, WorkerRole::Server, port).unwrap();
    handle
        .await_ready(&Readiness::Probe {
            timeout: Duration::from_secs(2),
        })
        .await
        .unwrap();

    handle.teardown(Duration::from_secs(2)).await;
    drop(listener);
}

#[tokio::test]
async fn test_probe_timeout_is_a_start_failure() {
    init_tracing();
    let stubs = StubBins::new();
    let worker = stubs.write("worker", ENGINE_SLEEP);

    // Nothing listens on the probed port.
    let cmd = vec![worker.display().to_string()];
    let mut handle = WorkerHandle::spawn(&cmd, WorkerRole::Server, 1).unwrap();
    let err = handle
        .await_ready(&Readiness::Probe {
            timeout: Duration::from_millis(200),
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not accepting connections"));

    // The handle still reaches a terminal state through teardown.
    let outcome = handle.teardown(Duration::from_secs(2)).await;
    assert!(matches!(
        outcome,
        TeardownOutcome::Graceful | TeardownOutcome::Forced
    ));
}
