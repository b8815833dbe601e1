//! assetline - compile, fingerprint and resolve web assets.

mod cli;

use anyhow::{Context, Result};
use assetline::{config::Project, log, logger};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() {
    if let Err(err) = run() {
        logger::set_quiet(false);
        log!("error"; "{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);
    logger::set_quiet(cli.quiet);

    let cwd = std::env::current_dir().context("Failed to get current working directory")?;
    let project = Project::discover(&cwd, &cli.config)?;

    match &cli.command {
        Commands::Precompile => cli::precompile::precompile(&project),
        Commands::Clean => cli::precompile::clean(&project),
        Commands::Compile { assets, app } => cli::lookup::compile(&project, assets, app.as_deref()),
        Commands::Resolve { assets, app, url } => {
            cli::lookup::resolve(&project, assets, app.as_deref(), *url)
        }
    }
}
