//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Publish a local project to GitHub Pages
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to the root (default: gh-publish.toml)
    #[arg(short = 'C', long, global = true, default_value = "gh-publish.toml")]
    pub config: PathBuf,

    /// Answer every prompt with its default
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Log every external command
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check tools, repository and remote, then publish interactively
    Publish,

    /// Deploy to the Pages branch without the interactive checks
    Deploy {
        /// Overwrite the published site
        #[arg(short, long)]
        force: bool,

        /// Skip `gh pages deploy` and use the git-based deployment
        #[arg(short, long)]
        manual: bool,

        /// Branch GitHub Pages serves from
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Report which gh subcommands are available and the detected remote
    Probe,
}
