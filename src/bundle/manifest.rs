//! The JSON manifest mapping original asset URLs to fingerprinted ones.
//!
//! ```json
//! {
//!   "/assets/application.js": {
//!     "target": "/assets/application-d1829dc353b734e3adc24855693b70f9.js",
//!     "sri": ["sha256-..."]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{AssetError, Result};
use crate::utils::fs::set_permissions;

/// One manifest value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub target: String,
    #[serde(default)]
    pub sri: Vec<String>,
}

/// Entries keyed by original URL, kept sorted for stable output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts for the same URL replace earlier ones.
    pub fn insert(&mut self, url: impl Into<String>, entry: ManifestEntry) {
        self.entries.insert(url.into(), entry);
    }

    pub fn get(&self, url: &str) -> Option<&ManifestEntry> {
        self.entries.get(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ManifestEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the manifest at `path`; `None` if there is no file.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AssetError::Io(path.to_path_buf(), err)),
        };
        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|err| AssetError::InvalidManifest(path.to_path_buf(), err))
    }

    /// Write to `path` through a temporary sibling file and a rename, so a
    /// reader sees either the old manifest or the complete new one.
    pub fn write(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir).map_err(AssetError::io(dir))?;

        let json = serde_json::to_vec_pretty(self)
            .map_err(|err| AssetError::Io(path.to_path_buf(), io::Error::other(err)))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(AssetError::io(dir))?;
        tmp.write_all(&json)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(AssetError::io(tmp.path()))?;
        tmp.persist(path)
            .map_err(|err| AssetError::Io(path.to_path_buf(), err.error))?;

        set_permissions(path).map_err(AssetError::io(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(target: &str) -> ManifestEntry {
        ManifestEntry {
            target: target.to_owned(),
            sri: vec!["sha256-x".to_owned()],
        }
    }

    #[test]
    fn test_write_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("public/assets.json");

        let mut manifest = Manifest::new();
        manifest.insert("/assets/b.css", entry("/assets/b-1.css"));
        manifest.insert("/assets/a.js", entry("/assets/a-2.js"));
        manifest.write(&path).unwrap();

        let json = fs::read_to_string(&path).unwrap();
        assert!(json.find("/assets/a.js").unwrap() < json.find("/assets/b.css").unwrap());
        assert_eq!(Manifest::load(&path).unwrap(), Some(manifest));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }
    }

    #[test]
    fn test_overwrite_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assets.json");

        Manifest::new().write(&path).unwrap();
        let mut manifest = Manifest::new();
        manifest.insert("/assets/a.js", entry("/assets/a-2.js"));
        manifest.write(&path).unwrap();

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(Manifest::load(&path).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_load_absent_and_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assets.json");
        assert_eq!(Manifest::load(&path).unwrap(), None);

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Manifest::load(&path).unwrap_err(),
            AssetError::InvalidManifest(..)
        ));
    }

    #[test]
    fn test_sri_defaults_to_empty() {
        let manifest: Manifest =
            serde_json::from_str(r#"{"/assets/a.js": {"target": "/assets/a-1.js"}}"#).unwrap();
        assert!(manifest.get("/assets/a.js").unwrap().sri.is_empty());
    }
}
