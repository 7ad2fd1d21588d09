//! Best-effort cleanup of intermediate files.
//!
//! Window clips, audio tracks and frames are scratch data. Failing to delete
//! one is logged and otherwise ignored.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

/// Remove a file, ignoring "not found" and logging any other failure.
///
/// Returns `true` when the file was actually deleted.
pub async fn remove_quietly(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match fs::remove_file(path).await {
        Ok(()) => {
            tracing::trace!(path = %path.display(), "Removed intermediate file");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove intermediate file");
            false
        }
    }
}

/// Remove every path in `paths`, returning how many were deleted.
pub async fn release_paths<'a, I>(paths: I) -> usize
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    let mut removed = 0;
    for path in paths {
        if remove_quietly(path).await {
            removed += 1;
        }
    }
    removed
}
