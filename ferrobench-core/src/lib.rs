//! `FerroBench` core: benchmark orchestration engine
//!
//! Drives paired server/client tunnel workers as external processes,
//! provisions the credential material they need, measures download
//! throughput through the tunnel with an external HTTP client, and
//! aggregates one result record per test case.
//!
//! The crate deliberately implements no tunneling protocol. Everything
//! protocol-specific lives in the declarative [`matrix::TestCaseSpec`] and
//! the artifacts [`synth`] derives from it; the rest of the engine is the
//! same for every protocol family.

pub mod context;
pub mod materials;
pub mod matrix;
pub mod measure;
pub mod ports;
pub mod report;
pub mod runner;
pub mod synth;
pub mod worker;
pub mod workspace;

pub use context::HarnessContext;
pub use materials::{CredentialSet, CredentialStore, KeyType, MaterialsProvisioner};
pub use matrix::{CongestionControl, ProtocolVariant, Suite, TestCaseSpec};
pub use measure::{MeasurementRunner, Throughput};
pub use ports::{PortAllocator, PortPair};
pub use runner::{MatrixRunner, Outcome, ResultRecord, RunStatus};
pub use synth::ConfigArtifact;
pub use worker::{Readiness, TeardownOutcome, WorkerHandle, WorkerRole};
pub use workspace::Workspace;
