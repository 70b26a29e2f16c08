use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "wasmsched",
    about = "wasmsched — scheduling filters as WebAssembly guests",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one filter decision against JSON fixtures.
    ///
    /// Exits non-zero if the guest traps or the host faults. Rejections are
    /// printed like any other status.
    Filter {
        /// Plugin config (TOML)
        #[arg(short, long)]
        config: PathBuf,
        /// Workload (pod) as JSON
        #[arg(short, long)]
        workload: PathBuf,
        /// Placement target (node) as JSON; omitted means no target
        #[arg(short, long)]
        target: Option<PathBuf>,
        /// Print call statistics after the decision
        #[arg(long)]
        profile: bool,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Load a guest and check it against the host ABI.
    Check {
        /// Guest module (.wasm)
        guest: PathBuf,
        /// Link WASI preview1 while checking
        #[arg(long)]
        wasi: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wasmsched=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Filter {
            config,
            workload,
            target,
            profile,
            format,
        } => {
            commands::filter::run(&config, &workload, target.as_deref(), profile, &format).await
        }
        Commands::Check { guest, wasi } => commands::check::run(&guest, wasi).await,
    }
}
