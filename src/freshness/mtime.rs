//! Mtime helpers.
//!
//! The modification cache compares whole UTC seconds, so every mtime that
//! takes part in a freshness decision goes through [`mtime_secs`].

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Modification time truncated to whole seconds since the Unix epoch.
///
/// Sub-second precision is dropped: two writes within the same
/// second compare equal.
pub fn mtime_secs(path: &Path) -> Option<u64> {
    let time = get_mtime(path)?;
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Some(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_mtime_secs_missing_file() {
        assert_eq!(mtime_secs(Path::new("/nonexistent/file.css")), None);
    }

    #[test]
    fn test_mtime_secs_truncates_subsecond() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.js");
        fs::write(&path, "alert(1)").unwrap();

        let time = UNIX_EPOCH + Duration::from_millis(1_700_000_000_750);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(time)
            .unwrap();

        assert_eq!(mtime_secs(&path), Some(1_700_000_000));
    }
}
