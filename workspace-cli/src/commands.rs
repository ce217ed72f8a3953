use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "workspace-cli", version, about = "Headless workspace configuration tool")]
pub struct Cli {
    /// Print debug logs from the workspace engine
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a configuration headlessly and print what a user would see
    Inspect {
        config: PathBuf,
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Only build panels of the active tab
        #[arg(long)]
        deferred: bool,
        /// Print the configuration as saved after loading
        #[arg(long, alias = "jq")]
        json: bool,
    },
    /// Load, save and reload a configuration and compare the results
    Roundtrip {
        config: PathBuf,
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Write the first saved configuration here
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
