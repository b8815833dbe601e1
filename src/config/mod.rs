//! Project configuration loaded from `assets.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── app        # AssetsConfig, one frozen snapshot per application
//! ├── base_url   # scheme://host[:port] for CDN mode
//! ├── error      # ConfigError
//! └── mod.rs     # Project (this file)
//! ```
//!
//! # Format
//!
//! ```toml
//! public_dir = "public"
//! manifest = "assets.json"
//!
//! [[app]]                 # the first app is the default one
//! name = "web"
//! prefix = "/assets"
//! sources = ["app/assets"]
//! fingerprint = true
//! subresource_integrity = ["sha384"]
//! javascript_compressor = "builtin"
//! ```

mod app;
mod base_url;
mod error;
mod util;

pub use app::{AssetsConfig, SriAlgorithm};
pub use base_url::BaseUrl;
pub use error::ConfigError;

use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::log;
use util::find_config_file;

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

// ============================================================================
// raw file layout
// ============================================================================

#[derive(Debug, Deserialize)]
struct ProjectFile {
    #[serde(default = "default_public_dir")]
    public_dir: PathBuf,

    #[serde(default = "default_manifest")]
    manifest: PathBuf,

    #[serde(default, rename = "app")]
    apps: Vec<AppSection>,
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_manifest() -> PathBuf {
    PathBuf::from(AssetsConfig::DEFAULT_MANIFEST)
}

/// One `[[app]]` table.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct AppSection {
    name: Option<String>,
    prefix: String,
    sources: Vec<PathBuf>,
    compile: bool,
    fingerprint: bool,
    subresource_integrity: Vec<SriAlgorithm>,
    cdn: bool,
    scheme: String,
    host: String,
    port: u16,
    javascript_compressor: Option<String>,
    stylesheet_compressor: Option<String>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            prefix: AssetsConfig::DEFAULT_PREFIX.to_owned(),
            sources: vec![PathBuf::from("assets")],
            compile: true,
            fingerprint: false,
            subresource_integrity: Vec::new(),
            cdn: false,
            scheme: "http".to_owned(),
            host: "localhost".to_owned(),
            port: 2300,
            javascript_compressor: None,
            stylesheet_compressor: None,
        }
    }
}

// ============================================================================
// Project
// ============================================================================

/// Every application sharing one public directory.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config_path: Option<PathBuf>,
    apps: Vec<Arc<AssetsConfig>>,
}

impl Project {
    pub const FILE_NAME: &'static str = "assets.toml";

    /// Search upward from `start` for `config_name` and load it.
    pub fn discover(start: &Path, config_name: &Path) -> Result<Self> {
        let path = find_config_file(start, config_name).ok_or_else(|| {
            ConfigError::Validation(format!(
                "config file `{}` not found in `{}` or any parent directory",
                config_name.display(),
                start.display()
            ))
        })?;
        Self::load(&path)
    }

    /// Load `path`; relative paths inside resolve against its directory.
    ///
    /// Unknown keys are reported as a warning and otherwise ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (file, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        let root = path
            .parent()
            .map(crate::utils::fs::normalize_path)
            .unwrap_or_default();
        let mut project = Self::build(file, &root)?;
        project.config_path = Some(path.to_path_buf());
        Ok(project)
    }

    /// Parse TOML content, resolving relative paths against `root`.
    pub fn from_str(content: &str, root: &Path) -> Result<Self> {
        let file: ProjectFile = toml::from_str(content)?;
        Self::build(file, root)
    }

    /// A project with a single, programmatically built application.
    pub fn single(config: AssetsConfig) -> Self {
        Self::from_apps(vec![config])
    }

    /// A project from pre-built applications; the first is the default.
    ///
    /// Callers are responsible for distinct prefixes.
    pub fn from_apps(apps: Vec<AssetsConfig>) -> Self {
        let root = apps
            .first()
            .and_then(|app| app.public_dir().parent())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            root,
            config_path: None,
            apps: apps.into_iter().map(Arc::new).collect(),
        }
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(ProjectFile, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let file = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((file, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    fn build(file: ProjectFile, root: &Path) -> Result<Self> {
        Self::validate(&file)?;

        let public_dir = root.join(&file.public_dir);
        let apps = file
            .apps
            .into_iter()
            .enumerate()
            .map(|(i, section)| {
                let name = section.name.unwrap_or_else(|| default_app_name(i));
                let config = AssetsConfig::new(root)
                    .with_name(name)
                    .with_sources(section.sources.iter().map(|s| root.join(s)))
                    .with_public_dir(&public_dir)
                    .with_prefix(&section.prefix)
                    .with_manifest(&file.manifest)
                    .with_compile(section.compile)
                    .with_fingerprint(section.fingerprint)
                    .with_subresource_integrity(&section.subresource_integrity)
                    .with_cdn(section.cdn)
                    .with_base_url(&section.scheme, &section.host, section.port)
                    .with_javascript_compressor(section.javascript_compressor)
                    .with_stylesheet_compressor(section.stylesheet_compressor);
                Arc::new(config)
            })
            .collect();

        Ok(Self {
            root: root.to_path_buf(),
            config_path: None,
            apps,
        })
    }

    fn validate(file: &ProjectFile) -> Result<()> {
        let mut errors = Vec::new();

        if file.apps.is_empty() {
            errors.push("at least one [[app]] table is required".to_owned());
        }

        let mut prefixes = FxHashSet::default();
        let mut names = FxHashSet::default();
        for (i, app) in file.apps.iter().enumerate() {
            let field = format!("app[{i}]");

            if !app.prefix.starts_with('/') || app.prefix.trim_matches('/').is_empty() {
                errors.push(format!(
                    "{field}.prefix `{}` must start with `/` and name a directory",
                    app.prefix
                ));
            } else if !prefixes.insert(app::normalize_prefix(&app.prefix)) {
                errors.push(format!("{field}.prefix `{}` is used twice", app.prefix));
            }

            let name = app.name.clone().unwrap_or_else(|| default_app_name(i));
            if !names.insert(name.clone()) {
                errors.push(format!("{field}.name `{name}` is used twice"));
            }

            if app.sources.is_empty() {
                errors.push(format!("{field}.sources must list at least one directory"));
            }

            if !matches!(app.scheme.as_str(), "http" | "https") {
                errors.push(format!(
                    "{field}.scheme `{}` must be `http` or `https`",
                    app.scheme
                ));
            }

            if app.host.trim().is_empty() {
                errors.push(format!("{field}.host must not be empty"));
            }
        }

        match ConfigError::from_messages(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // accessors
    // ------------------------------------------------------------------

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn apps(&self) -> &[Arc<AssetsConfig>] {
        &self.apps
    }

    /// The first application.
    ///
    /// # Panics
    ///
    /// If built with [`from_apps`](Self::from_apps) and no applications.
    pub fn default_app(&self) -> &Arc<AssetsConfig> {
        &self.apps[0]
    }

    pub fn app(&self, name: &str) -> Option<&Arc<AssetsConfig>> {
        self.apps.iter().find(|app| app.name() == name)
    }
}

fn default_app_name(index: usize) -> String {
    if index == 0 {
        "default".to_owned()
    } else {
        format!("app{index}")
    }
}
