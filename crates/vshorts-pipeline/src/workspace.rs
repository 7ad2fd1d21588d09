//! Per-run scratch directory.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::PipelineResult;

/// Temporary directory holding every intermediate file of one run.
///
/// Dropping it removes the directory even when the run fails early.
#[derive(Debug)]
pub struct RunWorkspace {
    dir: TempDir,
}

impl RunWorkspace {
    /// Create `vshorts-<run_id>-XXXX` under `parent`, or the system temp dir.
    pub fn create(run_id: &str, parent: Option<&Path>) -> PipelineResult<Self> {
        let prefix = format!("vshorts-{}-", run_id);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };

        debug!(path = %dir.path().display(), "Created run workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now, logging instead of failing.
    pub fn close(self) {
        let path: PathBuf = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(path = %path.display(), "Removed run workspace"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove run workspace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_lifecycle() {
        let parent = TempDir::new().unwrap();
        let workspace = RunWorkspace::create("abc", Some(parent.path())).unwrap();
        let path = workspace.path().to_path_buf();

        assert!(path.starts_with(parent.path()));
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("vshorts-abc-")));

        std::fs::write(path.join("window_0000000.mp4"), b"x").unwrap();
        workspace.close();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let path = {
            let workspace = RunWorkspace::create("drop", None).unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
