//! Scoped cleanup of temporary export artifacts
//!
//! Every finsql.exe invocation gets a private diagnostic log path and, for
//! single-object export, a private target path. [`TempArtifact`] guarantees
//! those files are gone on every exit path, including cancellation and
//! panic. Deletion failures never shadow the primary outcome; they are
//! logged and swallowed.

use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// Generate a unique path in the system temp directory.
///
/// Per-call artifact paths must never collide between concurrent exports, so
/// each gets a fresh random identifier.
pub(crate) fn unique_temp_path(prefix: &str, extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{prefix}{}.{extension}", Uuid::new_v4()))
}

/// Delete a file, tolerating its absence and swallowing failures.
pub(crate) fn safe_delete(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to delete temporary file");
        }
    }
}

/// Owns a temporary file path and deletes the file when dropped.
pub(crate) struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    /// Take ownership of a temporary path. The file need not exist yet; the
    /// external tool usually creates it.
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The guarded path
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        safe_delete(&self.path);
    }
}
