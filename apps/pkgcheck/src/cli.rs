//! Command line interface definition

use clap::{Parser, Subcommand};
use pkgcheck_types::ColorChoice;
use std::path::PathBuf;

/// pkgcheck - validate a package directory before publishing
#[derive(Parser)]
#[command(name = "pkgcheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate a package directory before publishing")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run every check over a package directory
    Check {
        /// Package root containing package.json
        dir: PathBuf,

        /// Skip checks that need the package registry or baseline blobs
        #[arg(long)]
        offline: bool,

        /// Report a check as skipped instead of running it (repeatable)
        #[arg(long = "exclude", value_name = "ID")]
        exclude: Vec<String>,
    },

    /// List every check identifier and the checker that owns it
    #[command(alias = "ls")]
    ListChecks,
}
