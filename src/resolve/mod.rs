//! Render-time asset URL resolution.
//!
//! A pure read of the configuration and, when fingerprinting or subresource
//! integrity is on, the manifest written by the bundler.

mod push;

pub use push::PushPromises;

use std::sync::Arc;

use crate::bundle::{Manifest, ManifestEntry};
use crate::config::AssetsConfig;
use crate::error::{AssetError, Result};

/// URL and integrity values for one logical asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub url: String,
    pub sri: Vec<String>,
}

#[derive(Debug, Clone)]
enum ManifestState {
    /// Neither fingerprinting nor SRI; URLs are synthesized.
    NotRequired,
    /// Required, but no file was found when the resolver was built.
    Missing,
    Loaded(Manifest),
}

/// Resolves logical asset names for one application.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    config: Arc<AssetsConfig>,
    manifest: ManifestState,
}

impl ManifestResolver {
    /// Load the manifest if `config` needs one.
    ///
    /// A missing file is not an error yet: it surfaces as
    /// [`AssetError::MissingManifestFile`] on the first lookup. A file that
    /// is present but not valid JSON fails here.
    pub fn new(config: Arc<AssetsConfig>) -> Result<Self> {
        let manifest = if config.requires_manifest() {
            match Manifest::load(&config.manifest_path())? {
                Some(manifest) => ManifestState::Loaded(manifest),
                None => ManifestState::Missing,
            }
        } else {
            ManifestState::NotRequired
        };
        Ok(Self { config, manifest })
    }

    /// Use an already loaded manifest.
    pub fn with_manifest(config: Arc<AssetsConfig>, manifest: Manifest) -> Self {
        Self {
            config,
            manifest: ManifestState::Loaded(manifest),
        }
    }

    pub fn config(&self) -> &AssetsConfig {
        &self.config
    }

    /// Resolve `logical` (`application.js`) to its URL path and integrity
    /// values.
    pub fn resolve(&self, logical: &str) -> Result<ResolvedAsset> {
        let path = self.config.prefixed_path(logical);
        let Some(entry) = self.entry(&path)? else {
            return Ok(ResolvedAsset {
                url: path,
                sri: Vec::new(),
            });
        };

        let url = if self.config.fingerprint() {
            entry.target.clone()
        } else {
            path
        };
        let sri = if self.config.is_subresource_integrity_enabled() {
            entry.sri.clone()
        } else {
            Vec::new()
        };
        Ok(ResolvedAsset { url, sri })
    }

    /// The fingerprinted URL path recorded for `logical`.
    pub fn target(&self, logical: &str) -> Result<String> {
        let path = self.config.prefixed_path(logical);
        Ok(self.require_entry(&path)?.target.clone())
    }

    /// The integrity values recorded for `logical`.
    pub fn sri(&self, logical: &str) -> Result<Vec<String>> {
        let path = self.config.prefixed_path(logical);
        Ok(self.require_entry(&path)?.sri.clone())
    }

    /// Space-separated `integrity` attribute value; `None` with SRI off.
    pub fn subresource_integrity_value(&self, logical: &str) -> Result<Option<String>> {
        if !self.config.is_subresource_integrity_enabled() {
            return Ok(None);
        }
        Ok(Some(self.resolve(logical)?.sri.join(" ")))
    }

    /// Path for `src`/`href` attributes.
    ///
    /// Absolute and protocol-relative sources are returned unchanged. In CDN
    /// mode the result carries the base URL.
    pub fn asset_path(&self, source: &str) -> Result<String> {
        if is_absolute_url(source) {
            return Ok(source.to_owned());
        }
        let url = self.resolve(source)?.url;
        if self.config.cdn() {
            Ok(self.config.base_url().join(&url))
        } else {
            Ok(url)
        }
    }

    /// [`asset_path`](Self::asset_path), recording the result in `push`.
    pub fn asset_path_with(&self, source: &str, push: &mut PushPromises) -> Result<String> {
        let path = self.asset_path(source)?;
        push.push(path.clone());
        Ok(path)
    }

    /// Always absolute: the base URL joined with the resolved path.
    pub fn asset_url(&self, source: &str) -> Result<String> {
        if is_absolute_url(source) {
            return Ok(source.to_owned());
        }
        let url = self.resolve(source)?.url;
        Ok(self.config.base_url().join(&url))
    }

    /// Whether `url` is absolute and served from another origin than the
    /// configured base URL.
    pub fn crossorigin(&self, url: &str) -> bool {
        is_absolute_url(url) && !self.config.base_url().is_same_origin(url)
    }

    /// Manifest entry for `path`, or `None` when no manifest is in play.
    fn entry(&self, path: &str) -> Result<Option<&ManifestEntry>> {
        match &self.manifest {
            ManifestState::NotRequired => Ok(None),
            _ => self.require_entry(path).map(Some),
        }
    }

    fn require_entry(&self, path: &str) -> Result<&ManifestEntry> {
        let manifest_path = || self.config.manifest_path();
        match &self.manifest {
            ManifestState::Loaded(manifest) => {
                manifest
                    .get(path)
                    .ok_or_else(|| AssetError::MissingManifestAsset {
                        asset: path.to_owned(),
                        manifest: manifest_path(),
                    })
            }
            ManifestState::NotRequired | ManifestState::Missing => {
                Err(AssetError::MissingManifestFile(manifest_path()))
            }
        }
    }
}

fn is_absolute_url(source: &str) -> bool {
    source.starts_with("//") || source.starts_with("http://") || source.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SriAlgorithm;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn manifest() -> Manifest {
        let mut manifest = Manifest::new();
        manifest.insert(
            "/assets/application.js",
            ManifestEntry {
                target: "/assets/application-abc123.js".to_owned(),
                sri: vec!["sha256-aaa".to_owned(), "sha384-bbb".to_owned()],
            },
        );
        manifest
    }

    fn config() -> AssetsConfig {
        AssetsConfig::new(Path::new("/srv/app"))
    }

    #[test]
    fn test_development_path() {
        let resolver = ManifestResolver::new(Arc::new(config())).unwrap();

        assert_eq!(resolver.asset_path("application.js").unwrap(), "/assets/application.js");
        assert_eq!(resolver.resolve("application.js").unwrap().sri, Vec::<String>::new());
        assert_eq!(resolver.subresource_integrity_value("application.js").unwrap(), None);
        assert_eq!(
            resolver.asset_url("application.js").unwrap(),
            "http://localhost:2300/assets/application.js"
        );
    }

    #[test]
    fn test_root_prefix_path() {
        let resolver = ManifestResolver::new(Arc::new(config().with_prefix("/"))).unwrap();
        assert_eq!(resolver.asset_path("application.js").unwrap(), "/application.js");
        assert_eq!(
            resolver.asset_url("application.js").unwrap(),
            "http://localhost:2300/application.js"
        );
    }

    #[test]
    fn test_fingerprinted_path() {
        let resolver = ManifestResolver::with_manifest(
            Arc::new(config().with_fingerprint(true)),
            manifest(),
        );
        assert_eq!(
            resolver.asset_path("application.js").unwrap(),
            "/assets/application-abc123.js"
        );
        assert_eq!(resolver.target("application.js").unwrap(), "/assets/application-abc123.js");
        assert!(resolver.resolve("application.js").unwrap().sri.is_empty());
    }

    #[test]
    fn test_integrity_without_fingerprint() {
        let resolver = ManifestResolver::with_manifest(
            Arc::new(
                config().with_subresource_integrity(&[SriAlgorithm::Sha256, SriAlgorithm::Sha384]),
            ),
            manifest(),
        );
        let resolved = resolver.resolve("application.js").unwrap();
        assert_eq!(resolved.url, "/assets/application.js");
        assert_eq!(resolved.sri.len(), 2);
        assert_eq!(
            resolver.subresource_integrity_value("application.js").unwrap().unwrap(),
            "sha256-aaa sha384-bbb"
        );
        assert_eq!(resolver.sri("application.js").unwrap().len(), 2);
    }

    #[test]
    fn test_missing_manifest_asset() {
        let resolver = ManifestResolver::with_manifest(
            Arc::new(config().with_fingerprint(true)),
            manifest(),
        );
        let err = resolver.asset_path("missing.js").unwrap_err();
        assert!(matches!(err, AssetError::MissingManifestAsset { .. }));

        let message = err.to_string();
        assert!(message.contains("missing.js"));
        assert!(message.contains("/srv/app/public/assets.json"));
    }

    #[test]
    fn test_missing_manifest_file() {
        let dir = TempDir::new().unwrap();
        let config = AssetsConfig::new(dir.path()).with_fingerprint(true);
        let resolver = ManifestResolver::new(Arc::new(config)).unwrap();

        let err = resolver.asset_path("application.js").unwrap_err();
        assert!(matches!(err, AssetError::MissingManifestFile(_)));
        assert!(err.to_string().contains("assets.json"));
    }

    #[test]
    fn test_loads_manifest_from_disk() {
        let dir = TempDir::new().unwrap();
        let config = AssetsConfig::new(dir.path()).with_fingerprint(true);
        manifest().write(&config.manifest_path()).unwrap();

        let resolver = ManifestResolver::new(Arc::new(config)).unwrap();
        assert_eq!(
            resolver.asset_path("application.js").unwrap(),
            "/assets/application-abc123.js"
        );
    }

    #[test]
    fn test_invalid_manifest_fails_early() {
        let dir = TempDir::new().unwrap();
        let config = AssetsConfig::new(dir.path()).with_fingerprint(true);
        fs::create_dir_all(dir.path().join("public")).unwrap();
        fs::write(config.manifest_path(), "[]").unwrap();

        assert!(matches!(
            ManifestResolver::new(Arc::new(config)).unwrap_err(),
            AssetError::InvalidManifest(..)
        ));
    }

    #[test]
    fn test_cdn_and_crossorigin() {
        let resolver = ManifestResolver::with_manifest(
            Arc::new(
                config()
                    .with_fingerprint(true)
                    .with_cdn(true)
                    .with_base_url("https", "cdn.example.com", 443),
            ),
            manifest(),
        );
        let path = resolver.asset_path("application.js").unwrap();
        assert_eq!(path, "https://cdn.example.com/assets/application-abc123.js");
        assert_eq!(resolver.asset_url("application.js").unwrap(), path);

        assert!(!resolver.crossorigin(&path));
        assert!(!resolver.crossorigin("/assets/application.js"));
        assert!(resolver.crossorigin("https://code.jquery.com/jquery.js"));
        assert!(resolver.crossorigin("//code.jquery.com/jquery.js"));
    }

    #[test]
    fn test_absolute_sources_pass_through() {
        let resolver = ManifestResolver::with_manifest(
            Arc::new(config().with_fingerprint(true)),
            Manifest::new(),
        );
        for source in ["https://code.jquery.com/jquery.js", "//cdn.example.com/x.js"] {
            assert_eq!(resolver.asset_path(source).unwrap(), source);
            assert_eq!(resolver.asset_url(source).unwrap(), source);
        }
    }

    #[test]
    fn test_push_promises() {
        let resolver = ManifestResolver::with_manifest(
            Arc::new(config().with_fingerprint(true)),
            manifest(),
        );
        let mut push = PushPromises::new();
        resolver.asset_path_with("application.js", &mut push).unwrap();
        resolver.asset_path_with("application.js", &mut push).unwrap();

        assert_eq!(push.iter().collect::<Vec<_>>(), ["/assets/application-abc123.js"]);
    }
}
