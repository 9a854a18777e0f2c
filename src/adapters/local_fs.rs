//! Local filesystem probe.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::ProbeError;
use crate::traits::{ProbeResult, TriggerProbe};

/// Checks `<directory>/<filename>` on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalProbe {
    path: PathBuf,
}

impl LocalProbe {
    pub fn new(directory: &Path, filename: &str) -> Self {
        Self {
            path: directory.join(filename),
        }
    }

    /// Full path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TriggerProbe for LocalProbe {
    fn probe(&self) -> Result<ProbeResult, ProbeError> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ProbeResult::missing()),
            Err(source) => {
                return Err(ProbeError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match metadata.modified() {
            Ok(modified) => Ok(ProbeResult::present(DateTime::<Utc>::from(modified))),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "Platform reported no mtime");
                Ok(ProbeResult::present_without_mtime())
            }
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let probe = LocalProbe::new(dir.path(), "trigger.txt");
        assert_eq!(probe.probe().unwrap(), ProbeResult::missing());
    }

    #[test]
    fn test_missing_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let probe = LocalProbe::new(&dir.path().join("not-yet-created"), "trigger.txt");
        assert!(!probe.probe().unwrap().exists);
    }

    #[test]
    fn test_present_file_reports_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let file = File::create(dir.path().join("trigger.txt")).unwrap();
        let stamp = SystemTime::now() - Duration::from_secs(3600);
        file.set_modified(stamp).unwrap();

        let result = LocalProbe::new(dir.path(), "trigger.txt").probe().unwrap();
        assert!(result.exists);
        let modified = result.modified_at.unwrap();
        let expected = DateTime::<Utc>::from(stamp);
        assert!((modified - expected).num_seconds().abs() <= 1);
    }

    #[test]
    fn test_describe_is_full_path() {
        let probe = LocalProbe::new(Path::new("/srv/drop"), "done.flag");
        assert_eq!(probe.path(), Path::new("/srv/drop/done.flag"));
        assert!(probe.describe().ends_with("done.flag"));
    }
}
