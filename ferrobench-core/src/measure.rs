//! Throughput measurement via the external HTTP client
//!
//! One GET against the benchmark endpoint, body discarded, with the
//! client's own machine-readable transfer-speed figure as the sole datum.
//! When an ingress port is supplied the request is routed through the
//! local SOCKS front end with proxy-side name resolution, so tunnels are
//! also exercised for DNS handling.

use crate::context::HarnessContext;
use ferrobench_common::constants::BENCH_PATH;
use ferrobench_common::{BenchError, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// One throughput sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    /// Download speed in MiB per second
    pub mib_s: f64,
}

impl Throughput {
    pub fn from_bytes_per_sec(bps: f64) -> Self {
        Self {
            mib_s: bps / BYTES_PER_MIB,
        }
    }

    /// Informational Gbit/s figure for reporting.
    pub fn gbit_s(self) -> f64 {
        self.mib_s * 8.0 / 1000.0
    }
}

/// Runs the external HTTP client against the benchmark endpoint
pub struct MeasurementRunner {
    curl: String,
    url: String,
}

impl MeasurementRunner {
    pub fn new(ctx: &HarnessContext) -> Self {
        Self {
            curl: ctx.binaries.curl.clone(),
            url: format!("http://127.0.0.1:{}{BENCH_PATH}", ctx.http_port),
        }
    }

    /// Take one sample, optionally through the SOCKS ingress on loopback.
    pub async fn measure(&self, ingress_port: Option<u16>) -> Result<Throughput> {
        let sink = if cfg!(windows) { "NUL" } else { "/dev/null" };

        let mut cmd = Command::new(&self.curl);
        cmd.arg("--silent")
            .arg("--show-error")
            .arg("-o")
            .arg(sink)
            .arg(&self.url)
            .arg("-w")
            .arg("%{speed_download}");

        if let Some(port) = ingress_port {
            // socks5h: hostnames resolve through the proxy, not locally.
            cmd.arg("-x").arg(format!("socks5h://127.0.0.1:{port}"));
        }

        debug!("Measuring via {} (ingress: {:?})", self.url, ingress_port);

        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| BenchError::Measurement(format!("failed to run {}: {e}", self.curl)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BenchError::Measurement(format!(
                "{} exited with {}: {}",
                self.curl,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let bps = parse_speed(&stdout).ok_or_else(|| {
            BenchError::Measurement(format!("unparsable speed output: {:?}", stdout.trim()))
        })?;

        Ok(Throughput::from_bytes_per_sec(bps))
    }
}

/// Parse the client's textual bytes-per-second figure.
fn parse_speed(output: &str) -> Option<f64> {
    output.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
