//! FerroBench Unified CLI
//!
//! Throughput benchmarks for secure tunnel protocol stacks.

// Use mimalloc as the global allocator for better performance
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ferrobench",
    author,
    version,
    about = "Throughput benchmarks for secure tunnel protocols",
    long_about = "FerroBench measures download throughput through external tunnel\n\
                  implementations (Shadowsocks, Trojan, AnyTLS, TUIC) under comparable\n\
                  conditions, driving pre-built server/client binaries out of process.",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a benchmark suite
    Run(commands::run::RunArgs),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A .env next to the harness may select the benchmark endpoint port.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
