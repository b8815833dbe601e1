//! The precompile phase: every source of every application, compiled
//! from scratch into its destination directory.

use std::path::PathBuf;
use std::sync::Arc;

use crate::compiler::{Compiler, Outcome, SourceFile};
use crate::config::Project;
use crate::engine::EngineChain;
use crate::error::{AssetError, Result};
use crate::freshness::ModificationCache;
use crate::logger::ProgressLine;
use crate::utils::fs::remove_dir_if_exists;
use crate::{debug, log};

/// A source queued for one application's compiler.
#[derive(Debug, Clone)]
pub struct PendingSource {
    app: usize,
    source: SourceFile,
}

impl PendingSource {
    pub fn source(&self) -> &SourceFile {
        &self.source
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrecompileReport {
    pub compiled: usize,
    pub copied: usize,
    pub fresh: usize,
}

impl PrecompileReport {
    pub fn total(&self) -> usize {
        self.compiled + self.copied + self.fresh
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Compiled => self.compiled += 1,
            Outcome::Copied => self.copied += 1,
            Outcome::Fresh => self.fresh += 1,
        }
    }
}

/// Drives one [`Compiler`] per application, with compilation forced on.
#[derive(Debug, Clone)]
pub struct Precompiler {
    compilers: Vec<Compiler>,
    manifest: PathBuf,
}

impl Precompiler {
    pub fn new(
        project: &Project,
        cache: Arc<ModificationCache>,
        engines: Arc<EngineChain>,
    ) -> Self {
        let compilers = project
            .apps()
            .iter()
            .map(|app| {
                let forced = Arc::new(app.as_ref().clone().with_compile(true));
                Compiler::new(forced, Arc::clone(&cache), Arc::clone(&engines))
            })
            .collect();

        Self {
            compilers,
            manifest: project.default_app().manifest_path(),
        }
    }

    /// Remove every destination directory and the manifest.
    pub fn clean(&self) -> Result<()> {
        for dir in self.destinations() {
            remove_dir_if_exists(&dir).map_err(AssetError::io(&dir))?;
            debug!("precompile"; "removed {}", dir.display());
        }
        match std::fs::remove_file(&self.manifest) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
                Err(AssetError::Io(self.manifest.clone(), err))
            }
            _ => Ok(()),
        }
    }

    /// [`clean`](Self::clean), then recreate empty destination directories.
    pub fn reset(&self) -> Result<()> {
        self.clean()?;
        for dir in self.destinations() {
            std::fs::create_dir_all(&dir).map_err(AssetError::io(&dir))?;
        }
        Ok(())
    }

    /// Every source of every application, in configuration order.
    pub fn sources(&self) -> Vec<PendingSource> {
        self.compilers
            .iter()
            .enumerate()
            .flat_map(|(app, compiler)| {
                compiler
                    .sources()
                    .files()
                    .into_iter()
                    .map(move |source| PendingSource { app, source })
            })
            .collect()
    }

    /// Compile `sources` one after another; the first error aborts.
    pub fn compile_all(
        &self,
        sources: &[PendingSource],
        progress: Option<&ProgressLine>,
    ) -> Result<PrecompileReport> {
        let mut report = PrecompileReport::default();
        for pending in sources {
            let compiler = &self.compilers[pending.app];
            let compiled = compiler.compile_source(&pending.source).inspect_err(|err| {
                log!("error"; "{}: {}", pending.source.relative().display(), err);
            })?;
            report.record(compiled.outcome);
            if let Some(progress) = progress {
                progress.inc("compile");
            }
        }
        Ok(report)
    }

    /// [`reset`](Self::reset) and compile everything.
    pub fn run(&self) -> Result<PrecompileReport> {
        self.reset()?;
        let sources = self.sources();
        self.compile_all(&sources, None)
    }

    /// Distinct destination directories, in configuration order.
    fn destinations(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::with_capacity(self.compilers.len());
        for compiler in &self.compilers {
            let dir = compiler.config().destination_dir();
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetsConfig;
    use std::fs;
    use tempfile::TempDir;

    fn project(dir: &TempDir) -> Project {
        let root = dir.path();
        Project::from_apps(vec![
            AssetsConfig::new(root).with_compile(false),
            AssetsConfig::new(root)
                .with_name("admin")
                .with_prefix("/admin/assets")
                .with_sources([root.join("admin")]),
        ])
    }

    fn touch(path: PathBuf) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_run_clears_and_compiles_every_app() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root.join("assets/app.js"));
        touch(root.join("assets/images/logo.png"));
        touch(root.join("assets/_private.js"));
        touch(root.join("admin/admin.css"));
        touch(root.join("public/assets/stale.js"));
        touch(root.join("public/assets.json"));
        touch(root.join("public/robots.txt"));

        let precompiler = Precompiler::new(
            &project(&dir),
            Arc::new(ModificationCache::new()),
            Arc::new(EngineChain::empty()),
        );
        let report = precompiler.run().unwrap();

        assert_eq!(report.copied, 3);
        assert_eq!(report.total(), 3);
        assert!(root.join("public/assets/app.js").exists());
        assert!(root.join("public/assets/images/logo.png").exists());
        assert!(root.join("public/admin/assets/admin.css").exists());
        assert!(!root.join("public/assets/_private.js").exists());
        assert!(!root.join("public/assets/stale.js").exists());
        assert!(!root.join("public/assets.json").exists());
        // only destination trees are cleared
        assert!(root.join("public/robots.txt").exists());
    }

    #[test]
    fn test_clean_removes_outputs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root.join("public/assets/app.js"));
        touch(root.join("public/admin/assets/admin.css"));
        touch(root.join("public/assets.json"));

        let precompiler = Precompiler::new(
            &project(&dir),
            Arc::new(ModificationCache::new()),
            Arc::new(EngineChain::empty()),
        );
        precompiler.clean().unwrap();
        precompiler.clean().unwrap();

        assert!(!root.join("public/assets").exists());
        assert!(!root.join("public/admin/assets").exists());
        assert!(!root.join("public/assets.json").exists());
    }

    #[test]
    fn test_compile_error_aborts() {
        let dir = TempDir::new().unwrap();
        touch(dir.path().join("assets/theme.scss"));

        let precompiler = Precompiler::new(
            &Project::single(AssetsConfig::new(dir.path())),
            Arc::new(ModificationCache::new()),
            Arc::new(EngineChain::empty()),
        );
        crate::logger::set_quiet(true);
        assert!(matches!(
            precompiler.run().unwrap_err(),
            AssetError::UnknownAssetEngine(_)
        ));
    }
}
