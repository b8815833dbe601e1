//! Production build: precompile, then compress, fingerprint and emit the
//! manifest.
//!
//! # Phases
//!
//! ```text
//! Precompiler  sources ──compile──▶ public/<prefix>/app.js
//! Bundler      app.js ──compress──▶ app.js ──md5──▶ app-<hash>.js
//!                                          └─sri──▶ manifest entry
//! ```
//!
//! The bundle phase lists every artifact first and then processes them in
//! parallel; each file is touched by exactly one worker. Two builds running
//! against the same public directory at once are not supported.

pub mod digest;
mod manifest;
mod precompile;

pub use manifest::{Manifest, ManifestEntry};
pub use precompile::{PendingSource, PrecompileReport, Precompiler};

use jwalk::WalkDir;
use rayon::prelude::*;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compress::{AssetKind, Compressor, CompressorRegistry};
use crate::config::{AssetsConfig, Project};
use crate::engine::EngineChain;
use crate::error::{AssetError, Result};
use crate::freshness::ModificationCache;
use crate::logger::ProgressLine;
use crate::utils::fs::{copy_artifact, set_permissions, to_url_path, write_artifact};
use crate::{debug, log};
use digest::{fingerprint, fingerprinted_name, integrity};

/// A compiled file found in a destination tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Artifact {
    /// Public URL path, e.g. `/assets/app.js`.
    pub url: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleReport {
    pub assets: usize,
    /// Artifacts left uncompressed because their compressor failed.
    pub compress_failures: Vec<PathBuf>,
    pub manifest: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub precompile: PrecompileReport,
    pub bundle: BundleReport,
}

/// An application with its compressors resolved.
struct Governor {
    config: Arc<AssetsConfig>,
    javascript: Option<Arc<dyn Compressor>>,
    stylesheet: Option<Arc<dyn Compressor>>,
}

impl Governor {
    fn compressor(&self, kind: AssetKind) -> Option<&Arc<dyn Compressor>> {
        match kind {
            AssetKind::Javascript => self.javascript.as_ref(),
            AssetKind::Stylesheet => self.stylesheet.as_ref(),
        }
    }
}

struct Bundled {
    url: String,
    entry: ManifestEntry,
    compress_failed: Option<PathBuf>,
}

/// Second pass over the compiled output of every application.
pub struct Bundler {
    governors: Vec<Governor>,
    manifest: PathBuf,
}

impl Bundler {
    /// Resolve every application's compressors up front, so an unknown
    /// compressor name fails before any file is touched.
    pub fn new(project: &Project, registry: &CompressorRegistry) -> Result<Self> {
        let resolve = |config: &AssetsConfig, kind| {
            let selector = config.compressor(kind);
            if selector.is_none() {
                Ok(None)
            } else {
                registry.resolve(kind, selector).map(Some)
            }
        };

        let governors = project
            .apps()
            .iter()
            .map(|config| {
                Ok(Governor {
                    javascript: resolve(config, AssetKind::Javascript)?,
                    stylesheet: resolve(config, AssetKind::Stylesheet)?,
                    config: Arc::clone(config),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            governors,
            manifest: project.default_app().manifest_path(),
        })
    }

    /// Every file under every distinct destination directory.
    ///
    /// A missing destination directory is fatal.
    pub fn collect(&self) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        let mut walked = Vec::new();

        for governor in &self.governors {
            let config = &governor.config;
            let dir = config.destination_dir();
            if walked.contains(&dir) {
                continue;
            }
            if !dir.is_dir() {
                return Err(AssetError::MissingDestination(dir));
            }

            let files = WalkDir::new(&dir)
                .sort(true)
                .skip_hidden(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file());

            for entry in files {
                let path = entry.path();
                if path == self.manifest {
                    continue;
                }
                let Ok(relative) = path.strip_prefix(config.public_dir()) else {
                    continue;
                };
                let url = format!("/{}", to_url_path(relative));
                artifacts.push(Artifact { url, path });
            }
            walked.push(dir);
        }

        // nested destination trees are walked twice
        artifacts.sort();
        artifacts.dedup_by(|a, b| a.path == b.path);
        Ok(artifacts)
    }

    /// Compress, fingerprint and digest `artifacts`, then write the manifest.
    pub fn bundle(
        &self,
        artifacts: &[Artifact],
        progress: Option<&ProgressLine>,
    ) -> Result<BundleReport> {
        let bundled = artifacts
            .par_iter()
            .map(|artifact| {
                let result = self.process(artifact);
                if let Some(progress) = progress {
                    progress.inc("bundle");
                }
                result
            })
            .collect::<Result<Vec<_>>>()?;

        let mut manifest = Manifest::new();
        let mut compress_failures = Vec::new();
        for item in bundled {
            manifest.insert(item.url, item.entry);
            compress_failures.extend(item.compress_failed);
        }
        manifest.write(&self.manifest)?;
        debug!("bundle"; "wrote {} entries to {}", manifest.len(), self.manifest.display());

        Ok(BundleReport {
            assets: manifest.len(),
            compress_failures,
            manifest: self.manifest.clone(),
        })
    }

    /// [`collect`](Self::collect) and [`bundle`](Self::bundle).
    pub fn run(&self) -> Result<BundleReport> {
        let artifacts = self.collect()?;
        self.bundle(&artifacts, None)
    }

    /// First non-default app whose prefix owns `url`, else the default.
    fn governor(&self, url: &str) -> &Governor {
        self.governors[1..]
            .iter()
            .find(|g| g.config.owns_url(url))
            .unwrap_or(&self.governors[0])
    }

    fn process(&self, artifact: &Artifact) -> Result<Bundled> {
        let governor = self.governor(&artifact.url);
        let path = &artifact.path;

        let compress_failed = self.compress(governor, path)?.then(|| path.clone());
        set_permissions(path).map_err(AssetError::io(path))?;

        let content = fs::read(path).map_err(AssetError::io(path))?;
        let hash = fingerprint(&content);

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target_name = fingerprinted_name(&file_name, &hash);
        let target_path = path.with_file_name(&target_name);
        copy_artifact(path, &target_path).map_err(AssetError::io(&target_path))?;

        let target = match artifact.url.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{target_name}"),
            None => target_name,
        };
        let sri = governor
            .config
            .subresource_integrity()
            .iter()
            .map(|&algorithm| integrity(algorithm, &content))
            .collect();

        Ok(Bundled {
            url: artifact.url.clone(),
            entry: ManifestEntry { target, sri },
            compress_failed,
        })
    }

    /// Compress `path` in place. Returns whether compression failed.
    ///
    /// Failures keep the original content and are logged, never raised.
    fn compress(&self, governor: &Governor, path: &Path) -> Result<bool> {
        let Some(kind) = AssetKind::from_path(path) else {
            return Ok(false);
        };
        if is_minified(path) {
            return Ok(false);
        }
        let Some(compressor) = governor.compressor(kind) else {
            return Ok(false);
        };

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                report_compress_failure(path, compressor.name(), &err);
                return Ok(true);
            }
            Err(err) => return Err(AssetError::Io(path.to_path_buf(), err)),
        };

        match compressor.compress(&content) {
            Ok(compressed) => {
                write_artifact(path, compressed).map_err(AssetError::io(path))?;
                Ok(false)
            }
            Err(err) => {
                report_compress_failure(path, compressor.name(), &err);
                Ok(true)
            }
        }
    }
}

/// `app.min.js`, `vendor.min.css`.
fn is_minified(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with(".min"))
}

fn report_compress_failure(path: &Path, compressor: &str, err: &(dyn StdError + 'static)) {
    let mut chain = String::new();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    log!(
        "compress";
        "skipping compression of `{}` ({compressor}): {err}{chain}",
        path.display()
    );
}

/// Full production build: precompile every application, then bundle.
///
/// Compressors are resolved before anything is deleted.
pub fn build(
    project: &Project,
    engines: Arc<EngineChain>,
    registry: &CompressorRegistry,
) -> Result<BuildReport> {
    let bundler = Bundler::new(project, registry)?;
    let precompiler = Precompiler::new(project, Arc::new(ModificationCache::new()), engines);

    precompiler.reset()?;
    let sources = precompiler.sources();
    let progress = ProgressLine::new(&[("compile", sources.len())]);
    let precompile = precompiler.compile_all(&sources, Some(&progress))?;
    progress.finish();

    let artifacts = bundler.collect()?;
    let progress = ProgressLine::new(&[("bundle", artifacts.len())]);
    let bundle = bundler.bundle(&artifacts, Some(&progress))?;
    progress.finish();

    Ok(BuildReport { precompile, bundle })
}
