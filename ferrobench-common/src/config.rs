//! Configuration types for a `FerroBench` run

use crate::constants::{DEFAULT_BASE_CLIENT_PORT, DEFAULT_BASE_SERVER_PORT, DEFAULT_PORT_STRIDE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// External binaries the harness drives.
///
/// Plain names resolve through `PATH`; absolute paths are passed through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinariesConfig {
    /// sing-box compatible engine (`<engine> run -c <config>`)
    pub engine: String,
    /// Cryptographic toolkit used for certificate material
    pub openssl: String,
    /// HTTP measurement client
    pub curl: String,
    /// shadowsocks-rust server
    pub ssserver: String,
    /// shadowsocks-rust client
    pub sslocal: String,
    /// Standalone AnyTLS server
    pub anytls_server: String,
    /// Standalone AnyTLS client
    pub anytls_client: String,
}

impl Default for BinariesConfig {
    fn default() -> Self {
        Self {
            engine: "sing-box".to_string(),
            openssl: "openssl".to_string(),
            curl: "curl".to_string(),
            ssserver: "ssserver".to_string(),
            sslocal: "sslocal".to_string(),
            anytls_server: "anytls-server".to_string(),
            anytls_client: "anytls-client".to_string(),
        }
    }
}

/// Port allocation parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PortsConfig {
    /// First server listener port
    pub base_server: u16,
    /// First client SOCKS ingress port
    pub base_client: u16,
    /// Advance per iteration, applied to both counters
    pub stride: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            base_server: DEFAULT_BASE_SERVER_PORT,
            base_client: DEFAULT_BASE_CLIENT_PORT,
            stride: DEFAULT_PORT_STRIDE,
        }
    }
}

/// Fixed pauses in the iteration lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Pause after spawning a worker before the liveness poll
    pub settle: Duration,
    /// Pause after both workers are up, before measuring
    pub measure_settle: Duration,
    /// Graceful termination window before a force kill
    pub teardown_grace: Duration,
    /// Pause after an iteration's teardown so listeners release their ports
    pub port_release_pause: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(800),
            measure_settle: Duration::from_millis(1200),
            teardown_grace: Duration::from_secs(4),
            port_release_pause: Duration::from_millis(400),
        }
    }
}
