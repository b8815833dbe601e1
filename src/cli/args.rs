//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Asset pipeline CLI: compile, fingerprint and resolve web assets
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(
        short = 'C',
        long,
        global = true,
        default_value = "assets.toml",
        value_hint = clap::ValueHint::FilePath
    )]
    pub config: PathBuf,

    /// Print per-file details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors and requested output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile, compress and fingerprint every asset, then write the manifest
    #[command(visible_alias = "p")]
    Precompile,

    /// Compile single assets into the destination directory
    #[command(visible_alias = "c")]
    Compile {
        /// Logical asset names, e.g. `javascripts/application.js`
        #[arg(required = true, value_name = "ASSET")]
        assets: Vec<String>,

        /// Application to compile for (default: the first one)
        #[arg(short, long)]
        app: Option<String>,
    },

    /// Print the URL and integrity value each asset resolves to
    #[command(visible_alias = "r")]
    Resolve {
        /// Logical asset names, e.g. `application.js`
        #[arg(required = true, value_name = "ASSET")]
        assets: Vec<String>,

        /// Application to resolve for (default: the first one)
        #[arg(short, long)]
        app: Option<String>,

        /// Print absolute URLs
        #[arg(short, long)]
        url: bool,
    },

    /// Remove compiled assets and the manifest
    Clean,
}
