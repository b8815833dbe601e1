//! Command-line interface module.

mod args;
pub mod lookup;
pub mod precompile;

pub use args::{Cli, Commands};

use anyhow::{Result, anyhow};
use assetline::config::{AssetsConfig, Project};
use std::sync::Arc;

/// The named application, or the default one.
fn select_app(project: &Project, name: Option<&str>) -> Result<Arc<AssetsConfig>> {
    match name {
        None => Ok(Arc::clone(project.default_app())),
        Some(name) => project.app(name).cloned().ok_or_else(|| {
            let known: Vec<_> = project.apps().iter().map(|a| a.name()).collect();
            anyhow!("unknown app `{name}` (configured: {})", known.join(", "))
        }),
    }
}
