//! Common utilities and types for `FerroBench`

pub mod config;
pub mod constants;
pub mod error;

pub use config::{BinariesConfig, PortsConfig, TimingConfig};
pub use constants::{
    BENCH_DOMAIN, DEFAULT_BASE_CLIENT_PORT, DEFAULT_BASE_SERVER_PORT, DEFAULT_HTTP_PORT,
    DEFAULT_PORT_STRIDE, HTTP_PORT_ENV,
};
pub use error::{BenchError, Result};
