//! Matrix orchestration
//!
//! Drives the test matrix strictly sequentially. Each iteration allocates
//! ports, resolves credentials, synthesizes artifacts, stands up the
//! server/client pair, takes one measurement and tears the pair down
//! through a release stack that runs on every exit path. Failures become
//! failure-flagged records; only an operator interrupt stops the matrix,
//! and even that path still removes the workspace.

use crate::context::HarnessContext;
use crate::materials::{CredentialStore, KeyType, MaterialsProvisioner};
use crate::matrix::TestCaseSpec;
use crate::measure::{MeasurementRunner, Throughput};
use crate::ports::PortAllocator;
use crate::synth::ConfigSynthesizer;
use crate::worker::{TeardownOutcome, WorkerHandle, WorkerRole};
use crate::workspace::Workspace;
use ferrobench_common::constants::BENCH_DOMAIN;
use ferrobench_common::Result;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Result of one test case (or the baseline)
#[derive(Debug, Clone)]
pub struct ResultRecord {
    pub label: String,
    pub outcome: Outcome,
}

/// Measured value or explicit failure marker
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Measured(Throughput),
    Failed,
}

/// How the matrix run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Interrupted,
}

/// Worker handles owned by the current iteration, released LIFO so the
/// client goes down before the server it is connected to.
#[derive(Default)]
struct ReleaseStack {
    workers: Vec<WorkerHandle>,
}

impl ReleaseStack {
    fn push(&mut self, worker: WorkerHandle) {
        self.workers.push(worker);
    }

    async fn release_all(&mut self, grace: Duration) {
        while let Some(worker) = self.workers.pop() {
            let role = worker.role();
            if let TeardownOutcome::Failed(e) = worker.teardown(grace).await {
                warn!("Teardown of {role} worker failed: {e}");
            }
        }
    }
}

/// Sequentially executes a test matrix and aggregates its records
pub struct MatrixRunner {
    ctx: HarnessContext,
    workspace: Workspace,
    allocator: PortAllocator,
    store: CredentialStore,
    interrupt: Arc<AtomicBool>,
}

impl MatrixRunner {
    /// Create the runner and its workspace.
    pub fn new(ctx: HarnessContext) -> Result<Self> {
        let workspace = Workspace::create()?;
        let allocator = PortAllocator::new(ctx.ports);
        Ok(Self {
            ctx,
            workspace,
            allocator,
            store: CredentialStore::default(),
            interrupt: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag observed at each iteration boundary; set it to stop the matrix.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Workspace root, for post-run assertions.
    pub fn workspace_path(&self) -> PathBuf {
        self.workspace.path().to_path_buf()
    }

    /// Run the baseline plus every test case, in order.
    ///
    /// Always returns one record per attempted measurement and always
    /// removes the workspace, whatever happened in between.
    pub async fn run(mut self, matrix: &[TestCaseSpec]) -> (Vec<ResultRecord>, RunStatus) {
        let mut records = Vec::with_capacity(matrix.len() + 1);
        let mut status = RunStatus::Completed;

        self.provision_certificates(matrix).await;

        let measurer = MeasurementRunner::new(&self.ctx);

        info!("=== no-proxy ===");
        records.push(record("no-proxy", measurer.measure(None).await));

        for spec in matrix {
            if self.interrupt.load(Ordering::Relaxed) {
                warn!("Interrupted; skipping remaining test cases");
                status = RunStatus::Interrupted;
                break;
            }

            info!("=== {} ===", spec.label);
            let result = self.run_case(spec, &measurer).await;
            records.push(record(&spec.label, result));
        }

        // Removal is attempted exactly once per run, unconditionally.
        if let Err(e) = self.workspace.close() {
            warn!("Workspace removal failed: {e}");
        }

        (records, status)
    }

    /// Certificates are materialized up front so every dependent case can
    /// share them; a failed kind only skips its own cases.
    async fn provision_certificates(&mut self, matrix: &[TestCaseSpec]) {
        let needed: BTreeSet<KeyType> = matrix
            .iter()
            .filter_map(|case| case.variant.key_type())
            .collect();
        if needed.is_empty() {
            return;
        }

        let provisioner = MaterialsProvisioner::new(&self.ctx, &self.workspace);
        for key_type in needed {
            match provisioner.certificate(key_type, BENCH_DOMAIN).await {
                Ok(set) => self.store.insert_certificate(set),
                Err(e) => warn!("Skipping {key_type}-dependent cases: {e}"),
            }
        }
    }

    async fn run_case(
        &mut self,
        spec: &TestCaseSpec,
        measurer: &MeasurementRunner,
    ) -> Result<Throughput> {
        let ports = spec.ports.unwrap_or_else(|| self.allocator.next_pair());
        let creds = self.store.resolve(&spec.variant)?;
        let artifact = ConfigSynthesizer::new(&self.ctx, &self.workspace).synthesize(
            &spec.label,
            &spec.variant,
            ports,
            &creds,
        )?;

        let mut stack = ReleaseStack::default();

        let server_cmd = artifact.server_command(&self.ctx);
        let client_cmd = artifact.client_command(&self.ctx);

        let result = async {
            let mut server = WorkerHandle::spawn(&server_cmd, WorkerRole::Server, ports.server)?;
            let server_ready = server.await_ready(&self.ctx.readiness).await;
            stack.push(server);
            server_ready?;

            let mut client = WorkerHandle::spawn(&client_cmd, WorkerRole::Client, ports.client)?;
            let client_ready = client.await_ready(&self.ctx.readiness).await;
            stack.push(client);
            client_ready?;

            sleep(self.ctx.timing.measure_settle).await;
            measurer.measure(Some(ports.client)).await
        }
        .await;

        // Both workers reach a terminal state before the next iteration,
        // whether the steps above succeeded or not.
        stack.release_all(self.ctx.timing.teardown_grace).await;
        sleep(self.ctx.timing.port_release_pause).await;

        result
    }
}

fn record(label: &str, result: Result<Throughput>) -> ResultRecord {
    match result {
        Ok(t) => {
            info!("  {:6.1} MiB/s   = {:5.2} Gbps", t.mib_s, t.gbit_s());
            ResultRecord {
                label: label.to_string(),
                outcome: Outcome::Measured(t),
            }
        }
        Err(e) => {
            warn!("  FAILED: {e}");
            ResultRecord {
                label: label.to_string(),
                outcome: Outcome::Failed,
            }
        }
    }
}
