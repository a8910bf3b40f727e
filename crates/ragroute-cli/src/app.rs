//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ragroute")]
#[command(
    author,
    version,
    about = "Route questions to the right document collection and answer them"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "RAGROUTE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Route and answer a question
    Ask(AskArgs),

    /// Show the routing decision for a question
    Route(RouteArgs),

    /// Chunk files and add them to a collection
    Ingest(IngestArgs),

    /// List the document collections
    Collections,

    /// Show the effective configuration
    Config,
}

#[derive(Args)]
pub struct AskArgs {
    /// Question to answer
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Answer from this collection without routing (products, support, finance)
    #[arg(short, long)]
    pub collection: Option<String>,

    /// Hide routing details
    #[arg(long)]
    pub no_routing: bool,

    /// Hide source documents
    #[arg(long)]
    pub no_sources: bool,
}

#[derive(Args)]
pub struct RouteArgs {
    /// Question to route
    #[arg(required = true)]
    pub question: Vec<String>,
}

#[derive(Args)]
pub struct IngestArgs {
    /// Target collection (products, support, finance)
    #[arg(short, long)]
    pub collection: String,

    /// Files or directories to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Cli,
    Json,
}
