//! Integration tests for `FerroBench`
//!
//! The scenarios run the real orchestrator end-to-end against stub
//! executables written into a per-test directory: a fake engine that
//! sleeps (or dies) like a tunnel worker, a fake measurement client that
//! prints a bytes-per-second figure, and a fake cryptographic toolkit.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod cleanup_test;
mod runner_test;
mod supervisor_test;

use ferrobench_common::{BinariesConfig, TimingConfig};
use ferrobench_core::{HarnessContext, Readiness};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tempfile::TempDir;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Directory of stub executables for one test
pub struct StubBins {
    pub dir: TempDir,
}

impl StubBins {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an executable `/bin/sh` script under the stub directory.
    #[cfg(unix)]
    pub fn write(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }
}

/// An engine stub that stays up until terminated, like a healthy worker.
pub const ENGINE_SLEEP: &str = "exec sleep 30";

/// A measurement stub reporting 128 MiB/s in bytes per second.
pub const CURL_FIXED_SPEED: &str = "echo 134217728";

/// Timing tuned for tests: short settles, bounded teardown.
pub fn fast_timing() -> TimingConfig {
    TimingConfig {
        settle: Duration::from_millis(50),
        measure_settle: Duration::from_millis(10),
        teardown_grace: Duration::from_secs(1),
        port_release_pause: Duration::from_millis(10),
    }
}

/// Context wired to the stub executables.
pub fn stub_context(stubs: &StubBins, engine: &Path, curl: &Path) -> HarnessContext {
    let openssl = stubs.path().join("openssl");
    HarnessContext::default()
        .with_binaries(BinariesConfig {
            engine: engine.display().to_string(),
            openssl: openssl.display().to_string(),
            curl: curl.display().to_string(),
            ssserver: stubs.path().join("ssserver").display().to_string(),
            sslocal: stubs.path().join("sslocal").display().to_string(),
            anytls_server: stubs.path().join("anytls-server").display().to_string(),
            anytls_client: stubs.path().join("anytls-client").display().to_string(),
        })
        .with_timing(fast_timing())
        .with_readiness(Readiness::Settle(fast_timing().settle))
}
