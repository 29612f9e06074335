//! Bitkit Notify CLI
//!
//! Command-line harness for the push notification pipeline: create the
//! device key, seal notifications as the push server would, open received
//! messages and simulate the wake job against a scripted node.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod scripted;
mod storage;
mod ui;

#[derive(Parser)]
#[command(name = "bitkit-notify")]
#[command(about = "Bitkit Notify CLI - Seal, open and simulate encrypted push notifications", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Custom storage directory for the device key
    #[arg(long, global = true)]
    storage_dir: Option<String>,

    /// JSON config file (domain label, key id, wake timing)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the device notification key
    Keygen {
        /// Replace an existing key
        #[arg(long)]
        force: bool,
    },

    /// Show the device notification public key
    Whoami,

    /// Encrypt a notification for a device
    Seal(commands::seal::SealArgs),

    /// Classify and decrypt a received push message
    Open {
        /// JSON file with the push fields, or '-' for stdin
        input: PathBuf,

        /// Write the resulting wake job to this file
        #[arg(long)]
        job_output: Option<PathBuf>,
    },

    /// Run a wake job against a scripted node
    Simulate(commands::simulate::SimulateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (stderr, so sealed output can be piped)
    let filter = if cli.verbose {
        "bitkit_notify_cli=debug,bitkit_notify=debug"
    } else {
        "bitkit_notify_cli=info,bitkit_notify=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Setup storage directory
    let storage_dir = if let Some(dir) = cli.storage_dir {
        PathBuf::from(dir)
    } else {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bitkit-notify")
    };

    let config = config::load(cli.config.as_deref())?;

    // Dispatch commands
    match cli.command {
        Commands::Keygen { force } => {
            commands::keygen::run(&storage_dir, &config, force).await?;
        }
        Commands::Whoami => {
            commands::whoami::run(&storage_dir, &config).await?;
        }
        Commands::Seal(args) => {
            commands::seal::run(&storage_dir, &config, args).await?;
        }
        Commands::Open { input, job_output } => {
            commands::open::run(&storage_dir, &config, &input, job_output.as_deref()).await?;
        }
        Commands::Simulate(args) => {
            commands::simulate::run(&config, args).await?;
        }
    }

    Ok(())
}
