use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use geovc_store::StorageFormat;

#[derive(Parser)]
#[command(
    name = "geovc",
    about = "GeoVC: version control for geographic feature data",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Working directory containing the repository
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    pub repo: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new repository
    Init(InitArgs),
    /// Check the repository's storage configuration
    Verify(VerifyArgs),
    /// Import newline-delimited JSON features into a tree
    Import(ImportArgs),
    /// Print a stored object
    Cat(CatArgs),
    /// List feature nodes in the working tree
    Ls(LsArgs),
    /// Get or set configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Storage format version for objects
    #[arg(long, default_value_t = StorageFormat::default())]
    pub format: StorageFormat,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Require this storage format instead of the recorded one
    #[arg(long)]
    pub format: Option<StorageFormat>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Destination tree path, e.g. `trees/roads`
    pub tree: String,
    /// NDJSON input, one feature per line
    pub file: PathBuf,
    /// JSON schema file for the features
    #[arg(long)]
    pub schema: Option<PathBuf>,
    /// Override the pending-feature flush threshold
    #[arg(long)]
    pub threshold: Option<usize>,
}

#[derive(Args)]
pub struct CatArgs {
    /// Object id (64 hex characters)
    pub id: String,
}

#[derive(Args)]
pub struct LsArgs {
    /// Only list nodes directly under this tree path
    pub tree: Option<String>,
}

#[derive(Args)]
pub struct ConfigArgs {
    pub key: Option<String>,
    pub value: Option<String>,
}
