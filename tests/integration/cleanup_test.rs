#![cfg(unix)]

//! Workspace lifecycle: the run directory must be gone after every exit
//! path, with failures injected at each stage of an iteration.

use crate::{init_tracing, stub_context, StubBins, CURL_FIXED_SPEED, ENGINE_SLEEP};
use ferrobench_core::{MatrixRunner, Outcome, ProtocolVariant, Suite, TestCaseSpec};

fn shadowsocks_case(label: &str) -> TestCaseSpec {
    TestCaseSpec::new(
        label,
        ProtocolVariant::Shadowsocks {
            method: "none".to_string(),
        },
    )
}

#[tokio::test]
async fn test_workspace_removed_after_clean_run() {
    init_tracing();
    let stubs = StubBins::new();
    let engine = stubs.write("engine", ENGINE_SLEEP);
    let curl = stubs.write("curl", CURL_FIXED_SPEED);

    let runner = MatrixRunner::new(stub_context(&stubs, &engine, &curl)).unwrap();
    let workspace = runner.workspace_path();
    assert!(workspace.is_dir());

    runner.run(&[shadowsocks_case("none")]).await;
    assert!(!workspace.exists());
}

#[tokio::test]
async fn test_workspace_removed_when_measurement_fails() {
    init_tracing();
    let stubs = StubBins::new();
    let engine = stubs.write("engine", ENGINE_SLEEP);
    let curl = stubs.write("curl", "echo 'curl: (7) Failed to connect' >&2\nexit 7");

    let runner = MatrixRunner::new(stub_context(&stubs, &engine, &curl)).unwrap();
    let workspace = runner.workspace_path();
    let (records, _) = runner.run(&[shadowsocks_case("none")]).await;

    assert!(records.iter().all(|r| matches!(r.outcome, Outcome::Failed)));
    assert!(!workspace.exists());
}

#[tokio::test]
async fn test_workspace_removed_when_workers_never_start() {
    init_tracing();
    let stubs = StubBins::new();
    let engine = stubs.write("engine", "echo 'no such protocol' >&2\nexit 2");
    let curl = stubs.write("curl", CURL_FIXED_SPEED);

    let runner = MatrixRunner::new(stub_context(&stubs, &engine, &curl)).unwrap();
    let workspace = runner.workspace_path();
    let (records, _) = runner.run(&[shadowsocks_case("none")]).await;

    assert!(matches!(records[1].outcome, Outcome::Failed));
    assert!(!workspace.exists());
}

#[tokio::test]
async fn test_workspace_removed_when_provisioning_fails_wholesale() {
    init_tracing();
    let stubs = StubBins::new();
    let engine = stubs.write("engine", ENGINE_SLEEP);
    let curl = stubs.write("curl", CURL_FIXED_SPEED);
    // No openssl stub at all: every certificate kind fails to provision.

    let runner = MatrixRunner::new(stub_context(&stubs, &engine, &curl)).unwrap();
    let workspace = runner.workspace_path();
    let (records, _) = runner.run(&Suite::Trojan.matrix()).await;

    // Baseline still measures; every certificate-dependent case fails.
    assert_eq!(records.len(), 3);
    assert!(matches!(records[0].outcome, Outcome::Measured(_)));
    assert!(matches!(records[1].outcome, Outcome::Failed));
    assert!(matches!(records[2].outcome, Outcome::Failed));
    assert!(!workspace.exists());
}
