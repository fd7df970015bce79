//! Run subcommand implementation

use anyhow::Result;
use clap::{Args, ValueEnum};
use ferrobench_common::{BinariesConfig, PortsConfig, TimingConfig};
use ferrobench_core::{report, HarnessContext, MatrixRunner, Readiness, RunStatus, Suite};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{info, warn};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SuiteArg {
    /// Shadowsocks via the sing-box engine
    Shadowsocks,
    /// Trojan over TLS via the sing-box engine
    Trojan,
    /// AnyTLS via the sing-box engine
    Anytls,
    /// TUIC over QUIC via the sing-box engine
    Tuic,
    /// Shadowsocks via standalone ssserver/sslocal
    SsRust,
    /// AnyTLS via standalone anytls-server/anytls-client
    AnytlsRs,
}

impl From<SuiteArg> for Suite {
    fn from(arg: SuiteArg) -> Self {
        match arg {
            SuiteArg::Shadowsocks => Suite::Shadowsocks,
            SuiteArg::Trojan => Suite::Trojan,
            SuiteArg::Anytls => Suite::AnyTls,
            SuiteArg::Tuic => Suite::Tuic,
            SuiteArg::SsRust => Suite::SsRust,
            SuiteArg::AnytlsRs => Suite::AnyTlsRs,
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Benchmark suite to execute
    #[arg(value_enum)]
    suite: SuiteArg,

    /// sing-box compatible engine binary
    #[arg(long, default_value = "sing-box", env = "FERROBENCH_ENGINE")]
    engine: String,

    /// Cryptographic toolkit binary
    #[arg(long, default_value = "openssl", env = "FERROBENCH_OPENSSL")]
    openssl: String,

    /// HTTP measurement client binary
    #[arg(long, default_value = "curl", env = "FERROBENCH_CURL")]
    curl: String,

    /// shadowsocks-rust server binary (ss-rust suite)
    #[arg(long, default_value = "ssserver")]
    ssserver: String,

    /// shadowsocks-rust client binary (ss-rust suite)
    #[arg(long, default_value = "sslocal")]
    sslocal: String,

    /// Standalone AnyTLS server binary (anytls-rs suite)
    #[arg(long, default_value = "anytls-server")]
    anytls_server: String,

    /// Standalone AnyTLS client binary (anytls-rs suite)
    #[arg(long, default_value = "anytls-client")]
    anytls_client: String,

    /// Benchmark HTTP server port on loopback
    #[arg(long, default_value_t = 8089, env = "HTTP_SERVER_PORT")]
    http_port: u16,

    /// First tunnel server listener port
    #[arg(long, default_value_t = 20000)]
    base_server_port: u16,

    /// First local SOCKS ingress port
    #[arg(long, default_value_t = 15000)]
    base_client_port: u16,

    /// Port advance between iterations
    #[arg(long, default_value_t = 4)]
    port_stride: u16,

    /// Actively probe worker listen ports instead of sleeping a fixed delay
    #[arg(long)]
    probe: bool,

    /// Settle delay after spawning a worker, in milliseconds
    #[arg(long, default_value_t = 800)]
    settle_ms: u64,

    /// Probe timeout in milliseconds (with --probe)
    #[arg(long, default_value_t = 5000)]
    probe_timeout_ms: u64,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let timing = TimingConfig {
        settle: Duration::from_millis(args.settle_ms),
        ..Default::default()
    };
    let readiness = if args.probe {
        Readiness::Probe {
            timeout: Duration::from_millis(args.probe_timeout_ms),
        }
    } else {
        Readiness::Settle(timing.settle)
    };

    let ctx = HarnessContext::default()
        .with_binaries(BinariesConfig {
            engine: args.engine,
            openssl: args.openssl,
            curl: args.curl,
            ssserver: args.ssserver,
            sslocal: args.sslocal,
            anytls_server: args.anytls_server,
            anytls_client: args.anytls_client,
        })
        .with_ports(PortsConfig {
            base_server: args.base_server_port,
            base_client: args.base_client_port,
            stride: args.port_stride,
        })
        .with_timing(timing)
        .with_http_port(args.http_port)
        .with_readiness(readiness);

    let suite: Suite = args.suite.into();
    let matrix = suite.matrix();
    info!(
        "Running {} suite: {} test cases against 127.0.0.1:{}",
        suite,
        matrix.len(),
        args.http_port
    );

    let runner = MatrixRunner::new(ctx)?;

    let interrupt = runner.interrupt_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current iteration");
            interrupt.store(true, Ordering::Relaxed);
        }
    });

    let (records, status) = runner.run(&matrix).await;

    match status {
        RunStatus::Completed => {
            report::print_summary(&records);
            Ok(())
        }
        RunStatus::Interrupted => {
            eprintln!("Interrupted.");
            std::process::exit(1);
        }
    }
}
