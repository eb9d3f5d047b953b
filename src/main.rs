mod commands;
mod config;
mod domain;
mod error;
mod probe;
mod report;
mod topology;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dchealth",
    version,
    about = "Health report generator for multi-domain directory-service forests"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the forest health report (diagnostics + replication)
    Report {
        /// Forest root domain (overrides config)
        #[arg(long)]
        forest: Option<String>,

        /// Per-probe timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Number of concurrent diagnostic probes
        #[arg(long)]
        concurrency: Option<usize>,

        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Enumerate forest nodes without probing them
    Nodes {
        /// Forest root domain (overrides config)
        #[arg(long)]
        forest: Option<String>,

        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            forest,
            timeout,
            concurrency,
            format,
        } => commands::report::run(commands::report::ReportOptions {
            forest,
            timeout,
            concurrency,
            format,
        }),
        Commands::Nodes { forest, format } => commands::nodes::run(forest.as_deref(), &format),
    }
}
