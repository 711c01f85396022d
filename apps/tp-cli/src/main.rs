//! # tp-cli
//!
//! Command-line interface for Topology Policy.
//!
//! - `tp topology list/validate/tree`: inspect stored topology snapshots
//! - `tp policies <topology> <compartment>`: effective compartment policies
//! - `tp preview <topology>`: deployment waves and parameter completeness

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tp_engine::{Engine, EngineConfig, OutputFormat};
use tracing_subscriber::EnvFilter;

/// Log directives used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str =
    "tp_cli=info,tp_engine=info,tp_topology=info,tp_policy=warn,tp_stack=warn";

/// Topology Policy CLI: resolve compartment policies and preview deployments.
#[derive(Parser)]
#[command(name = "tp", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Emit JSON instead of tables (overrides .tp/engine.toml).
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect stored topology snapshots.
    Topology {
        #[command(subcommand)]
        command: commands::topology::TopologyCommands,
    },
    /// Show the policies in effect for a compartment.
    Policies {
        /// Topology id.
        topology: String,
        /// Compartment id.
        compartment: String,
        /// Also show how every attachment along the chain was handled.
        #[arg(long)]
        trace: bool,
    },
    /// Preview deployment order and parameter resolution for a topology.
    Preview {
        /// Topology id.
        topology: String,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let mut config = EngineConfig::load(&project_root)?;
    if cli.json {
        config.format = OutputFormat::Json;
    }
    tracing::debug!(
        "project root {}, topologies in {}",
        project_root.display(),
        config.topologies_dir.display()
    );
    let engine = Engine::new(config);

    match &cli.command {
        Commands::Topology { command } => commands::topology::execute(command, &engine),
        Commands::Policies {
            topology,
            compartment,
            trace,
        } => commands::policies::execute(&engine, topology, compartment, *trace),
        Commands::Preview { topology } => commands::preview::execute(&engine, topology),
    }
}
