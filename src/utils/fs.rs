//! Filesystem helpers shared by the compiler and bundler.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Permission bits applied to every written artifact and the manifest.
pub const ARTIFACT_MODE: u32 = 0o644;

/// Write `content` to `path`, creating parent directories.
///
/// Truncates any existing file, then fixes its permission bits.
pub fn write_artifact(path: &Path, content: impl AsRef<[u8]>) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    set_permissions(path)
}

/// Copy `from` to `to` byte for byte, creating parent directories.
pub fn copy_artifact(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    set_permissions(to)
}

/// Apply [`ARTIFACT_MODE`] to `path`.
#[cfg(unix)]
pub fn set_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(ARTIFACT_MODE))
}

/// Permission bits are a Unix concept; elsewhere this is a no-op.
#[cfg(not(unix))]
pub fn set_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Remove a directory tree if it exists.
pub fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Render a relative path with forward slashes, for URLs and manifest keys.
pub fn to_url_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_artifact_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/app.js");

        write_artifact(&path, "a much longer first version").unwrap();
        write_artifact(&path, "short").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_artifact_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.css");
        write_artifact(&path, "body{}").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, ARTIFACT_MODE);
    }

    #[test]
    fn test_copy_artifact() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("logo.png");
        let to = dir.path().join("out/images/logo.png");
        fs::write(&from, [0u8, 1, 2, 255]).unwrap();

        copy_artifact(&from, &to).unwrap();
        assert_eq!(fs::read(&to).unwrap(), vec![0u8, 1, 2, 255]);
    }

    #[test]
    fn test_remove_dir_if_exists_missing() {
        let dir = TempDir::new().unwrap();
        remove_dir_if_exists(&dir.path().join("nope")).unwrap();
    }

    #[test]
    fn test_to_url_path() {
        assert_eq!(
            to_url_path(Path::new("javascripts/app.js")),
            "javascripts/app.js"
        );
        assert_eq!(to_url_path(Path::new("app.js")), "app.js");
    }

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }
}
