//! Per-run harness context
//!
//! One value constructed at startup carries everything the engine needs:
//! binary locations, port bases, timing knobs, the benchmark endpoint and
//! the readiness strategy. Components receive it by reference instead of
//! reading ambient global state.

use crate::worker::Readiness;
use ferrobench_common::{BinariesConfig, PortsConfig, TimingConfig};

/// Immutable configuration for one harness run
#[derive(Debug, Clone)]
pub struct HarnessContext {
    /// External binaries
    pub binaries: BinariesConfig,
    /// Port allocation parameters
    pub ports: PortsConfig,
    /// Lifecycle pauses
    pub timing: TimingConfig,
    /// Benchmark HTTP server port on loopback
    pub http_port: u16,
    /// How worker readiness is established after spawn
    pub readiness: Readiness,
}

impl Default for HarnessContext {
    fn default() -> Self {
        let timing = TimingConfig::default();
        Self {
            binaries: BinariesConfig::default(),
            ports: PortsConfig::default(),
            readiness: Readiness::Settle(timing.settle),
            timing,
            http_port: ferrobench_common::DEFAULT_HTTP_PORT,
        }
    }
}

impl HarnessContext {
    #[must_use]
    pub fn with_binaries(mut self, binaries: BinariesConfig) -> Self {
        self.binaries = binaries;
        self
    }

    #[must_use]
    pub fn with_ports(mut self, ports: PortsConfig) -> Self {
        self.ports = ports;
        self
    }

    #[must_use]
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    #[must_use]
    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }
}
