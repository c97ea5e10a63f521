//! In-flight uploads: temp file + fsync + exclusive publish

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

/// Size of each read from the upload stream
const CHUNK_SIZE: usize = 64 * 1024;

const STAGED_EXTENSION: &str = "part";

#[derive(Debug)]
pub(crate) enum StageError {
    Io(io::Error),
    TooLarge { limit: u64 },
}

impl From<io::Error> for StageError {
    fn from(e: io::Error) -> Self {
        StageError::Io(e)
    }
}

/// A temp file in the staging directory that is removed on drop unless it
/// was published. Dropping a `put` future mid-stream therefore leaves nothing behind.
pub(crate) struct StagedFile {
    path: PathBuf,
    file: Option<File>,
}

impl StagedFile {
    pub async fn create(staging_dir: &Path) -> io::Result<Self> {
        let path = staging_dir.join(format!("{}.{}", Uuid::new_v4(), STAGED_EXTENSION));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Copy `content` into the staged file and sync it to disk.
    /// Returns the number of bytes written.
    pub async fn write_from(
        &mut self,
        content: &mut (dyn AsyncRead + Unpin + Send),
        limit: u64,
    ) -> Result<u64, StageError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("staged file already closed"))?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut written: u64 = 0;
        loop {
            let n = content.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            written += n as u64;
            if written > limit {
                return Err(StageError::TooLarge { limit });
            }
            file.write_all(&buf[..n]).await?;
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }

    /// Link the staged file under `final_path`. Fails with `AlreadyExists`
    /// if the name is taken; never overwrites.
    pub async fn publish(mut self, final_path: &Path) -> io::Result<()> {
        // Close before linking so nothing else holds the handle.
        self.file.take();
        tokio::fs::hard_link(&self.path, final_path).await?;
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            // Drop retries the removal.
            debug!(path = ?self.path, error = %e, "Failed to remove staged file after publish");
        }
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.file.take();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.path, error = %e, "Failed to remove staged file"),
        }
    }
}

/// Remove leftovers from uploads interrupted by a crash. Returns how many were removed.
pub(crate) async fn purge(staging_dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(staging_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() {
            tokio::fs::remove_file(&path).await?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Flush directory entries (new links, unlinks) to disk.
#[cfg(unix)]
pub(crate) async fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
pub(crate) async fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
