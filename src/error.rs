//! Pipeline error types.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::compress::AssetKind;

pub type Result<T, E = AssetError> = std::result::Result<T, E>;

/// Errors surfaced by the compiler, bundler and resolver.
///
/// None of these are retried; the caller decides what to do next.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("missing asset: `{name}` (sources: {sources})")]
    MissingAsset { name: String, sources: SourceList },

    #[error("no asset engine can compile `{}`", .0.display())]
    UnknownAssetEngine(PathBuf),

    #[error("unknown {kind} compressor: `{name}`")]
    UnknownCompressor { kind: AssetKind, name: String },

    #[error("missing manifest file: `{}`, run the precompile task first", .0.display())]
    MissingManifestFile(PathBuf),

    #[error("missing asset `{asset}` in manifest `{}`", .manifest.display())]
    MissingManifestAsset { asset: String, manifest: PathBuf },

    #[error("{engine} failed to compile `{}`", .path.display())]
    Render {
        engine: &'static str,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid manifest file `{}`", .0.display())]
    InvalidManifest(PathBuf, #[source] serde_json::Error),

    #[error("destination directory `{}` is missing or not a directory", .0.display())]
    MissingDestination(PathBuf),

    #[error("IO error at `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |err| Self::Io(path, err)
    }
}

/// Source roots searched for a missing asset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceList(pub Vec<PathBuf>);

impl From<Vec<PathBuf>> for SourceList {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self(paths)
    }
}

impl fmt::Display for SourceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("none");
        }
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_asset_lists_sources() {
        let err = AssetError::MissingAsset {
            name: "app.js".into(),
            sources: vec![PathBuf::from("/a"), PathBuf::from("/b")].into(),
        };
        let display = err.to_string();
        assert!(display.contains("app.js"));
        assert!(display.contains("/a, /b"));
    }

    #[test]
    fn test_missing_manifest_asset_names_both() {
        let err = AssetError::MissingManifestAsset {
            asset: "/assets/missing.js".into(),
            manifest: PathBuf::from("/srv/public/assets.json"),
        };
        let display = err.to_string();
        assert!(display.contains("/assets/missing.js"));
        assert!(display.contains("/srv/public/assets.json"));
    }
}
