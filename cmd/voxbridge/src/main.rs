//! voxbridge - relays Ogg/Opus voice messages onto a continuous RTP stream.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigCommand, InspectCommand, StreamCommand};

/// voxbridge - relays Ogg/Opus voice messages as paced RTP.
///
/// Each voice file is demuxed into Opus packets which are re-timed onto
/// one RTP stream whose sequence numbers and timestamps continue across
/// files.
///
/// Configuration is stored in ~/.voxbridge/voxbridge/ and supports multiple
/// contexts, similar to kubectl's context management.
#[derive(Parser)]
#[command(name = "voxbridge")]
#[command(about = "Ogg/Opus to RTP relay")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.voxbridge/voxbridge/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Context name to use
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<PathBuf>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// Summarize the pages and packets of a voice file
    Inspect(InspectCommand),
    /// Stream voice files to an RTP target
    Stream(StreamCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Inspect(cmd) => cmd.run(&cli).await,
        Commands::Stream(cmd) => cmd.run(&cli).await,
    }
}
