use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Single on-disk mirror of the most recent synthesis result.
///
/// Writes go to a sibling temp file and are renamed into place, so a reader
/// never observes a truncated file. The lock serializes writers and cleanup,
/// and once cleanup has run later writes are skipped.
pub struct ScratchFile {
    path: PathBuf,
    closed: Mutex<bool>,
}

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            closed: Mutex::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let closed = self.closed.lock().await;
        if *closed {
            tracing::debug!(path = %self.path.display(), "Scratch file closed, skipping write");
            return Ok(());
        }

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &self.path).await
    }

    /// Best-effort removal; failures are logged, never returned.
    pub async fn cleanup(&self) {
        let mut closed = self.closed.lock().await;
        *closed = true;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Scratch file removed");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No scratch file to remove");
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove scratch file"
                );
            }
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}
