//! Error types for `FerroBench`
//!
//! Every per-iteration failure maps onto one of these variants; the
//! orchestrator converts them into failure-flagged result records instead
//! of aborting the matrix. Teardown has no variant here on purpose: it is
//! best-effort and reports through a non-error outcome type.

use thiserror::Error;

/// Main error type for `FerroBench` operations
#[derive(Error, Debug)]
pub enum BenchError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential or certificate generation did not produce the expected artifacts
    #[error("Provisioning failed: {0}")]
    Provisioning(String),

    /// Config artifact serialization or filesystem write error
    #[error("Config write failed: {0}")]
    ConfigWrite(String),

    /// Worker exited before the readiness check
    #[error("{role} worker failed to start: {diagnostic}")]
    ProcessStart {
        /// Role of the worker that failed (`server` or `client`)
        role: String,
        /// Captured stderr/stdout of the dead process
        diagnostic: String,
    },

    /// External HTTP client failed or produced unparsable output
    #[error("Measurement failed: {0}")]
    Measurement(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BenchError>;

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::ConfigWrite(err.to_string())
    }
}
