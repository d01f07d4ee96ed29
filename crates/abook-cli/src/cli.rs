use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "abook",
    about = "Addressbook registry: shared contacts and organizations across addressbooks",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the REST server
    Serve(ServeArgs),
    /// Load a data directory and check every membership invariant
    Verify(DataArgs),
    /// Load a data directory and print entity counts
    Stats(DataArgs),
    /// Remove every addressbook, contact, org, and address from data.json
    Clear(ClearArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Override the configured data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Never write data.json
    #[arg(long)]
    pub transient: bool,
}

#[derive(Args)]
pub struct DataArgs {
    /// Directory holding data.json or seed.json
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,
}

#[derive(Args)]
pub struct ClearArgs {
    #[command(flatten)]
    pub data: DataArgs,
    /// Confirm the removal
    #[arg(long)]
    pub yes: bool,
}
