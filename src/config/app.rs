//! Frozen per-application asset settings.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::BaseUrl;
use crate::compress::{AssetKind, CompressorSelector};

/// Digest algorithm for subresource integrity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SriAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl SriAlgorithm {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for SriAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for one application's assets.
///
/// Built once (from `assets.toml` or the `with_*` setters) and shared as
/// `Arc<AssetsConfig>`; nothing in the pipeline mutates it afterwards.
#[derive(Debug, Clone)]
pub struct AssetsConfig {
    name: String,
    sources: Vec<PathBuf>,
    public_dir: PathBuf,
    prefix: String,
    manifest: PathBuf,
    compile: bool,
    fingerprint: bool,
    subresource_integrity: Vec<SriAlgorithm>,
    cdn: bool,
    base_url: BaseUrl,
    javascript_compressor: CompressorSelector,
    stylesheet_compressor: CompressorSelector,
}

impl AssetsConfig {
    pub const DEFAULT_PREFIX: &'static str = "/assets";
    pub const DEFAULT_MANIFEST: &'static str = "assets.json";

    /// Defaults rooted at `root`: sources in `root/assets`, output in
    /// `root/public`.
    pub fn new(root: &Path) -> Self {
        Self {
            name: "default".to_owned(),
            sources: vec![root.join("assets")],
            public_dir: root.join("public"),
            prefix: Self::DEFAULT_PREFIX.to_owned(),
            manifest: PathBuf::from(Self::DEFAULT_MANIFEST),
            compile: true,
            fingerprint: false,
            subresource_integrity: Vec::new(),
            cdn: false,
            base_url: BaseUrl::default(),
            javascript_compressor: CompressorSelector::None,
            stylesheet_compressor: CompressorSelector::None,
        }
    }

    // ------------------------------------------------------------------
    // setters
    // ------------------------------------------------------------------

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Ordered source roots; the first one holding a file wins.
    pub fn with_sources<I, P>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = dir.into();
        self
    }

    /// URL prefix, normalized to a leading and no trailing slash.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = normalize_prefix(prefix);
        self
    }

    /// Manifest location; relative paths are taken from the public dir.
    pub fn with_manifest(mut self, manifest: impl Into<PathBuf>) -> Self {
        self.manifest = manifest.into();
        self
    }

    pub fn with_compile(mut self, compile: bool) -> Self {
        self.compile = compile;
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: bool) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    pub fn with_subresource_integrity(mut self, algorithms: &[SriAlgorithm]) -> Self {
        self.subresource_integrity = algorithms.to_vec();
        self
    }

    pub fn with_cdn(mut self, cdn: bool) -> Self {
        self.cdn = cdn;
        self
    }

    pub fn with_base_url(mut self, scheme: &str, host: &str, port: u16) -> Self {
        self.base_url = BaseUrl::new(scheme, host, port);
        self
    }

    pub fn with_javascript_compressor(mut self, selector: impl Into<CompressorSelector>) -> Self {
        self.javascript_compressor = selector.into();
        self
    }

    pub fn with_stylesheet_compressor(mut self, selector: impl Into<CompressorSelector>) -> Self {
        self.stylesheet_compressor = selector.into();
        self
    }

    // ------------------------------------------------------------------
    // accessors
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `public_dir/<prefix>`, where compiled assets land.
    pub fn destination_dir(&self) -> PathBuf {
        self.public_dir.join(self.prefix.trim_start_matches('/'))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.public_dir.join(&self.manifest)
    }

    pub fn compile(&self) -> bool {
        self.compile
    }

    pub fn fingerprint(&self) -> bool {
        self.fingerprint
    }

    pub fn subresource_integrity(&self) -> &[SriAlgorithm] {
        &self.subresource_integrity
    }

    pub fn is_subresource_integrity_enabled(&self) -> bool {
        !self.subresource_integrity.is_empty()
    }

    /// Fingerprinting or SRI needs a manifest at render time.
    pub fn requires_manifest(&self) -> bool {
        self.fingerprint || self.is_subresource_integrity_enabled()
    }

    pub fn cdn(&self) -> bool {
        self.cdn
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    pub fn compressor(&self, kind: AssetKind) -> &CompressorSelector {
        match kind {
            AssetKind::Javascript => &self.javascript_compressor,
            AssetKind::Stylesheet => &self.stylesheet_compressor,
        }
    }

    /// `application.js` -> `/assets/application.js`.
    pub fn prefixed_path(&self, logical: &str) -> String {
        let logical = logical.trim_start_matches('/');
        if self.is_root_prefix() {
            format!("/{logical}")
        } else {
            format!("{}/{logical}", self.prefix)
        }
    }

    /// Whether a public URL path lives under this application's prefix.
    pub fn owns_url(&self, url: &str) -> bool {
        if self.is_root_prefix() {
            return url.starts_with('/') && !url.starts_with("//");
        }
        url.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Assets served straight from the public dir.
    fn is_root_prefix(&self) -> bool {
        self.prefix == "/"
    }
}

pub(crate) fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    format!("/{trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AssetsConfig::new(Path::new("/srv/app"));
        assert_eq!(config.sources(), [PathBuf::from("/srv/app/assets")]);
        assert_eq!(config.destination_dir(), Path::new("/srv/app/public/assets"));
        assert_eq!(config.manifest_path(), Path::new("/srv/app/public/assets.json"));
        assert!(config.compile());
        assert!(!config.requires_manifest());
        assert!(config.compressor(AssetKind::Javascript).is_none());
    }

    #[test]
    fn test_prefix_normalization() {
        let config = AssetsConfig::new(Path::new("/srv")).with_prefix("admin/assets/");
        assert_eq!(config.prefix(), "/admin/assets");
        assert_eq!(config.destination_dir(), Path::new("/srv/public/admin/assets"));
        assert_eq!(config.prefixed_path("/app.js"), "/admin/assets/app.js");
    }

    #[test]
    fn test_owns_url() {
        let config = AssetsConfig::new(Path::new("/srv"));
        assert!(config.owns_url("/assets/app.js"));
        assert!(config.owns_url("/assets/js/app.js"));
        assert!(!config.owns_url("/assetsx/app.js"));
        assert!(!config.owns_url("/admin/assets/app.js"));
    }

    #[test]
    fn test_root_prefix() {
        let config = AssetsConfig::new(Path::new("/srv")).with_prefix("/");
        assert_eq!(config.prefix(), "/");
        assert_eq!(config.prefixed_path("application.js"), "/application.js");
        assert_eq!(config.prefixed_path("/js/app.js"), "/js/app.js");
        assert!(config.owns_url("/application.js"));
        assert!(!config.owns_url("//cdn.example.com/app.js"));
        assert_eq!(config.destination_dir(), Path::new("/srv/public"));
    }

    #[test]
    fn test_requires_manifest() {
        let root = Path::new("/srv");
        assert!(AssetsConfig::new(root).with_fingerprint(true).requires_manifest());
        assert!(
            AssetsConfig::new(root)
                .with_subresource_integrity(&[SriAlgorithm::Sha256])
                .requires_manifest()
        );
    }

    #[test]
    fn test_absolute_manifest() {
        let config = AssetsConfig::new(Path::new("/srv")).with_manifest("/var/assets.json");
        assert_eq!(config.manifest_path(), Path::new("/var/assets.json"));
    }
}
