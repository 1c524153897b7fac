use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "telefs",
    about = "Store and list files on a Telegram channel",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file; TELEFS_* environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Abort the command after this many seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload a file and add it to the catalog
    Put(PutArgs),
    /// List cataloged objects
    Ls(LsArgs),
    /// Show the catalog version and backend capabilities
    Info(InfoArgs),
}

#[derive(Args)]
pub struct PutArgs {
    /// File to upload, or `-` for stdin
    pub path: PathBuf,
    /// Object name; defaults to the file name
    #[arg(short, long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct LsArgs {
    /// Only list names starting with this prefix
    #[arg(default_value = "")]
    pub prefix: String,
}

#[derive(Args)]
pub struct InfoArgs {}
