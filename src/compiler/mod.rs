//! Incremental asset compilation.
//!
//! One request runs through: resolve the source, skip if fresh, copy or
//! render, write the artifact, record it in the modification cache.

mod sources;

pub use sources::{SourceFile, Sources};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AssetsConfig;
use crate::debug;
use crate::engine::{Engine, EngineChain, RenderOptions, extension_of};
use crate::error::{AssetError, Result};
use crate::freshness::ModificationCache;
use crate::utils::fs::{copy_artifact, write_artifact};

/// Extensions served as-is.
const PASSTHROUGH: &[&str] = &["js", "css", "map"];

/// Extensions that only make sense through an engine.
const TEMPLATE: &[&str] = &["scss", "sass", "less", "coffee", "es6", "babel", "jsx"];

/// What a compile request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Rendered through an engine.
    Compiled,
    /// Copied byte for byte.
    Copied,
    /// Destination present and source unchanged; nothing written.
    Fresh,
}

/// Result of one compile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: Outcome,
}

enum Action<'a> {
    Copy,
    Render(&'a Arc<dyn Engine>),
}

/// Compiles sources of one application into its destination directory.
///
/// The cache is shared with whoever else compiles in this process; the
/// compiler never owns global state.
#[derive(Debug, Clone)]
pub struct Compiler {
    config: Arc<AssetsConfig>,
    cache: Arc<ModificationCache>,
    engines: Arc<EngineChain>,
}

impl Compiler {
    pub fn new(
        config: Arc<AssetsConfig>,
        cache: Arc<ModificationCache>,
        engines: Arc<EngineChain>,
    ) -> Self {
        Self {
            config,
            cache,
            engines,
        }
    }

    pub fn config(&self) -> &Arc<AssetsConfig> {
        &self.config
    }

    pub fn sources(&self) -> Sources<'_> {
        Sources::new(self.config.sources())
    }

    /// Compile the asset answering the logical `name` (`javascripts/app.js`).
    pub fn compile(&self, name: &str) -> Result<Compiled> {
        let source = self
            .sources()
            .find(name, self.config.compile())
            .ok_or_else(|| AssetError::MissingAsset {
                name: name.to_owned(),
                sources: self.config.sources().to_vec().into(),
            })?;
        self.compile_source(&source)
    }

    /// Compile an already located source file.
    pub fn compile_source(&self, source: &SourceFile) -> Result<Compiled> {
        let action = self.plan(source.path())?;
        let destination = self
            .config
            .destination_dir()
            .join(artifact_path(source.relative(), &action));

        let compiled = |outcome| Compiled {
            source: source.path().to_path_buf(),
            destination: destination.clone(),
            outcome,
        };

        if destination.exists() && !self.cache.is_modified(source.path()) {
            debug!("compile"; "fresh {}", source.relative().display());
            return Ok(compiled(Outcome::Fresh));
        }

        match action {
            Action::Copy => {
                copy_artifact(source.path(), &destination)
                    .map_err(AssetError::io(&destination))?;
                self.cache.store(source.path(), &[]);
                debug!("compile"; "copied {}", source.relative().display());
                Ok(compiled(Outcome::Copied))
            }
            Action::Render(engine) => {
                let options = self.render_options(source.path());
                let content = engine.render(source.path(), &options).map_err(|err| {
                    AssetError::Render {
                        engine: engine.name(),
                        path: source.path().to_path_buf(),
                        source: err,
                    }
                })?;
                let dependencies = engine.dependencies(source.path(), &options);

                write_artifact(&destination, content).map_err(AssetError::io(&destination))?;
                self.cache.store(source.path(), &dependencies);
                debug!(
                    "compile";
                    "{} -> {} ({} dependencies)",
                    source.relative().display(),
                    destination.display(),
                    dependencies.len()
                );
                Ok(compiled(Outcome::Compiled))
            }
        }
    }

    /// Copy or render, by extension.
    fn plan(&self, path: &Path) -> Result<Action<'_>> {
        let ext = extension_of(path);
        if !self.config.compile() || ext.as_deref().is_some_and(|e| PASSTHROUGH.contains(&e)) {
            return Ok(Action::Copy);
        }
        if let Some(engine) = self.engines.find(path) {
            return Ok(Action::Render(engine));
        }
        if looks_compilable(path) {
            return Err(AssetError::UnknownAssetEngine(path.to_path_buf()));
        }
        // images, fonts and other static files
        Ok(Action::Copy)
    }

    /// The source's own directory, then every source root.
    fn render_options(&self, source: &Path) -> RenderOptions {
        let load_paths = source
            .parent()
            .map(Path::to_path_buf)
            .into_iter()
            .chain(self.config.sources().iter().cloned())
            .collect();
        RenderOptions { load_paths }
    }
}

/// A template extension, or `name.js.<ext>` / `name.css.<ext>`.
fn looks_compilable(path: &Path) -> bool {
    if extension_of(path).is_some_and(|e| TEMPLATE.contains(&e.as_str())) {
        return true;
    }
    path.file_stem()
        .map(Path::new)
        .and_then(extension_of)
        .is_some_and(|inner| matches!(inner.as_str(), "js" | "css"))
}

/// Destination path relative to the destination directory.
///
/// Rendering strips the engine extension, keeping an inner web extension
/// when there is one: `hello.js.coffee` -> `hello.js`, `app.coffee` ->
/// `app.js`, `theme.less` -> `theme.css`.
fn artifact_path(relative: &Path, action: &Action<'_>) -> PathBuf {
    let Action::Render(engine) = action else {
        return relative.to_path_buf();
    };

    let stem = relative.with_extension("");
    let inner = extension_of(&stem);
    if inner.is_some_and(|e| PASSTHROUGH.contains(&e.as_str())) {
        stem
    } else {
        let mut name = stem.into_os_string();
        name.push(".");
        name.push(engine.output_extension());
        PathBuf::from(name)
    }
}
