use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docchain",
    about = "docchain - tamper-evident documents on an append-only key-value engine",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Number of write workers (overrides the config file)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// TOML file with manager settings
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a JSON document, read it back, and verify its hash
    Store(StoreArgs),
    /// Print the properties a JSON document flattens to
    Flatten(FlattenArgs),
}

#[derive(Args)]
pub struct StoreArgs {
    /// Document ID
    #[arg(long)]
    pub id: String,
    /// JSON file to store
    #[arg(short, long)]
    pub input: PathBuf,
}

#[derive(Args)]
pub struct FlattenArgs {
    /// Document ID used as the path root
    #[arg(long)]
    pub id: String,
    /// JSON file to flatten
    #[arg(short, long)]
    pub input: PathBuf,
}
