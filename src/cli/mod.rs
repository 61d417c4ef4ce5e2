//! Command-line interface for olofooto.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Olofooto - photo sharing backend
#[derive(Parser)]
#[command(name = "olofooto")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    #[command(alias = "daemon")]
    Serve,

    /// Load and validate the configuration, then exit
    #[command(alias = "check")]
    CheckConfig,

    /// Write a config file with default values
    #[command(alias = "init")]
    InitConfig {
        /// Destination path
        #[arg(default_value = "config.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub use commands::*;
