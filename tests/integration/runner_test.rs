#![cfg(unix)]

use crate::{init_tracing, stub_context, StubBins, CURL_FIXED_SPEED, ENGINE_SLEEP};
use ferrobench_core::{MatrixRunner, Outcome, ProtocolVariant, RunStatus, Suite, TestCaseSpec};
use std::sync::atomic::Ordering;
use std::time::Duration;

fn single_shadowsocks_case() -> Vec<TestCaseSpec> {
    vec![TestCaseSpec::new(
        "aes-256-gcm",
        ProtocolVariant::Shadowsocks {
            method: "aes-256-gcm".to_string(),
        },
    )]
}

#[tokio::test]
async fn test_single_case_yields_baseline_and_success() {
    init_tracing();
    let stubs = StubBins::new();
    let engine = stubs.write("engine", ENGINE_SLEEP);
    let curl = stubs.write("curl", CURL_FIXED_SPEED);

    let runner = MatrixRunner::new(stub_context(&stubs, &engine, &curl)).unwrap();
    let workspace = runner.workspace_path();
    let (records, status) = runner.run(&single_shadowsocks_case()).await;

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].label, "no-proxy");

    for record in &records {
        match record.outcome {
            Outcome::Measured(t) => assert!(t.mib_s > 0.0),
            Outcome::Failed => panic!("{} unexpectedly failed", record.label),
        }
    }

    assert!(!workspace.exists());
}

#[tokio::test]
async fn test_failed_key_type_skips_only_its_cases() {
    init_tracing();
    let stubs = StubBins::new();
    let engine = stubs.write("engine", ENGINE_SLEEP);
    let curl = stubs.write("curl", CURL_FIXED_SPEED);
    // rsa material fails outright; ed25519 produces its files.
    stubs.write(
        "openssl",
        r#"if [ "$1" = "genrsa" ]; then
    echo "rsa unavailable" >&2
    exit 1
fi
out=""
prev=""
for a in "$@"; do
    if [ "$prev" = "-out" ]; then out="$a"; fi
    prev="$a"
done
if [ -n "$out" ]; then echo stub-material > "$out"; fi"#,
    );

    let runner = MatrixRunner::new(stub_context(&stubs, &engine, &curl)).unwrap();
    let (records, status) = runner.run(&Suite::AnyTls.matrix()).await;

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(records.len(), 3);

    let by_label = |label: &str| {
        records
            .iter()
            .find(|r| r.label == label)
            .unwrap_or_else(|| panic!("missing record {label}"))
    };
    assert!(matches!(
        by_label("anytls-rsa4096").outcome,
        Outcome::Failed
    ));
    assert!(matches!(
        by_label("anytls-ed25519").outcome,
        Outcome::Measured(_)
    ));
}

#[tokio::test]
async fn test_client_start_failure_still_tears_down_server() {
    init_tracing();
    let stubs = StubBins::new();
    let marker = stubs.path().join("server.stopped");
    let engine = stubs.write(
        "engine",
        &format!(
            r#"cfg="$3"
case "$cfg" in
    *client-*)
        echo "bind: address in use" >&2
        exit 1
        ;;
esac
trap 'touch {marker}; exit 0' TERM
sleep 30 &
wait"#,
            marker = marker.display()
        ),
    );
    let curl = stubs.write("curl", CURL_FIXED_SPEED);

    let runner = MatrixRunner::new(stub_context(&stubs, &engine, &curl)).unwrap();
    let (records, status) = runner.run(&single_shadowsocks_case()).await;

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(records.len(), 2);
    assert!(matches!(records[1].outcome, Outcome::Failed));
    // The server half received its termination request before the run moved on.
    assert!(marker.exists(), "server worker was not torn down");
}

#[tokio::test]
async fn test_interrupt_mid_matrix_stops_and_cleans_up() {
    init_tracing();
    let stubs = StubBins::new();
    let engine = stubs.write("engine", ENGINE_SLEEP);
    let counter = stubs.path().join("curl.count");
    let curl = stubs.write(
        "curl",
        &format!(
            "echo x >> {counter}\nsleep 1\necho 104857600",
            counter = counter.display()
        ),
    );

    let matrix: Vec<TestCaseSpec> = (0..5)
        .map(|i| {
            TestCaseSpec::new(
                format!("case-{i}"),
                ProtocolVariant::Shadowsocks {
                    method: "aes-256-gcm".to_string(),
                },
            )
        })
        .collect();

    let runner = MatrixRunner::new(stub_context(&stubs, &engine, &curl)).unwrap();
    let workspace = runner.workspace_path();
    let interrupt = runner.interrupt_flag();

    // Deliver the interrupt while the third measurement (baseline + two
    // cases) is in flight, mimicking an operator Ctrl-C mid-matrix.
    let watcher = tokio::spawn(async move {
        loop {
            let measurements = std::fs::read_to_string(&counter)
                .map(|s| s.lines().count())
                .unwrap_or(0);
            if measurements >= 3 {
                interrupt.store(true, Ordering::Relaxed);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    });

    let (records, status) = runner.run(&matrix).await;
    watcher.await.unwrap();

    assert_eq!(status, RunStatus::Interrupted);
    // Baseline plus exactly the two cases that completed before the flag.
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].label, "case-0");
    assert_eq!(records[2].label, "case-1");
    assert!(!workspace.exists());
}
