//! Default ports, endpoints and credential parameters for FerroBench runs.
//!
//! Use these constants instead of magic numbers so defaults stay consistent
//! across the core engine, CLI, and integration tests.

/// Default base port for tunnel server listeners.
pub const DEFAULT_BASE_SERVER_PORT: u16 = 20000;

/// Default base port for local SOCKS ingress listeners.
pub const DEFAULT_BASE_CLIENT_PORT: u16 = 15000;

/// Default port advance between consecutive iterations.
///
/// Ports are never reused within a run; the stride deliberately exceeds the
/// number of sockets one iteration can leave lingering in TIME_WAIT.
pub const DEFAULT_PORT_STRIDE: u16 = 4;

/// Default port of the benchmark HTTP server.
pub const DEFAULT_HTTP_PORT: u16 = 8089;

/// Environment variable selecting the benchmark HTTP server port.
pub const HTTP_PORT_ENV: &str = "HTTP_SERVER_PORT";

/// Path requested from the benchmark HTTP server.
pub const BENCH_PATH: &str = "/bench";

/// TLS server name used by every certificate-bearing test case.
pub const BENCH_DOMAIN: &str = "bench.local";

/// Certificate subject organization.
pub const CERT_ORG: &str = "benchmark";

/// Certificate subject country.
pub const CERT_COUNTRY: &str = "HK";

/// Self-signed certificate validity in days.
pub const CERT_VALIDITY_DAYS: u32 = 3650;
