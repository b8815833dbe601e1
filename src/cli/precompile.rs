//! `precompile` and `clean` commands.

use anyhow::{Context, Result};
use assetline::{
    bundle::{self, Precompiler},
    compress::CompressorRegistry,
    config::Project,
    engine::EngineChain,
    freshness::ModificationCache,
    log,
};
use std::{sync::Arc, time::Instant};

/// Full production build.
pub fn precompile(project: &Project) -> Result<()> {
    let started = Instant::now();
    let registry = CompressorRegistry::new();
    let engines = Arc::new(EngineChain::with_defaults());

    let report = bundle::build(project, engines, &registry).context("precompile failed")?;

    let precompile = &report.precompile;
    log!(
        "precompile";
        "{} sources ({} compiled, {} copied) in {:.2?}",
        precompile.total(),
        precompile.compiled,
        precompile.copied,
        started.elapsed()
    );
    if !report.bundle.compress_failures.is_empty() {
        log!(
            "warning";
            "{} assets left uncompressed, see above",
            report.bundle.compress_failures.len()
        );
    }
    log!(
        "bundle";
        "{} assets fingerprinted, manifest at {}",
        report.bundle.assets,
        report.bundle.manifest.display()
    );
    Ok(())
}

/// Remove every destination directory and the manifest.
pub fn clean(project: &Project) -> Result<()> {
    let precompiler = Precompiler::new(
        project,
        Arc::new(ModificationCache::new()),
        Arc::new(EngineChain::empty()),
    );
    precompiler.clean().context("clean failed")?;
    for app in project.apps() {
        log!("clean"; "removed {}", app.destination_dir().display());
    }
    Ok(())
}
