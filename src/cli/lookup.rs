//! `compile` and `resolve` commands.

use anyhow::{Context, Result};
use assetline::{
    compiler::{Compiler, Outcome},
    config::Project,
    engine::EngineChain,
    freshness::ModificationCache,
    log,
    resolve::ManifestResolver,
};
use std::sync::Arc;

use super::select_app;

/// Compile each logical asset for one application.
pub fn compile(project: &Project, assets: &[String], app: Option<&str>) -> Result<()> {
    let config = select_app(project, app)?;
    let compiler = Compiler::new(
        config,
        Arc::new(ModificationCache::new()),
        Arc::new(EngineChain::with_defaults()),
    );

    for name in assets {
        let compiled = compiler
            .compile(name)
            .with_context(|| format!("failed to compile `{name}`"))?;
        let verb = match compiled.outcome {
            Outcome::Compiled => "compiled",
            Outcome::Copied => "copied",
            Outcome::Fresh => "unchanged",
        };
        log!("compile"; "{verb} {name} -> {}", compiled.destination.display());
    }
    Ok(())
}

/// Print `name<TAB>url[<TAB>integrity]` per asset on stdout.
pub fn resolve(
    project: &Project,
    assets: &[String],
    app: Option<&str>,
    absolute: bool,
) -> Result<()> {
    let config = select_app(project, app)?;
    let resolver = ManifestResolver::new(config)?;

    for name in assets {
        let url = if absolute {
            resolver.asset_url(name)?
        } else {
            resolver.asset_path(name)?
        };
        match resolver.subresource_integrity_value(name)? {
            Some(integrity) => println!("{name}\t{url}\t{integrity}"),
            None => println!("{name}\t{url}"),
        }
    }
    Ok(())
}
