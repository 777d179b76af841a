//! Prospector CLI — the main entry point.
//!
//! Commands:
//! - `simulate` — Run a gathering session in the built-in simulator
//! - `probe`    — Check that the game host endpoint accepts connections
//! - `config`   — Show or initialize configuration
//! - `doctor`   — Diagnose setup problems

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "prospector",
    about = "Prospector — resource-gathering session controller",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full gathering session in the built-in simulator
    Simulate {
        /// Travel cycles to run before stopping
        #[arg(short, long, default_value_t = 2)]
        cycles: u64,

        /// Print the session summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the game host endpoint accepts connections
    Probe {
        /// Host to probe
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to probe (defaults to probe.port from config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Connect timeout in seconds (defaults to probe.timeout_secs from config)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose setup problems
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the resolved configuration
    Show,

    /// Write a default config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Simulate { cycles, json } => commands::simulate::run(cycles, json).await?,
        Commands::Probe {
            host,
            port,
            timeout_secs,
        } => commands::probe::run(&host, port, timeout_secs).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Init { force } => commands::config_cmd::init(force).await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
