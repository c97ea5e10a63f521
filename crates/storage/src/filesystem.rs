//! Filesystem-based storage implementation

mod staging;

use crate::error::{StorageError, StorageResult};
use crate::resolver::PathResolver;
use crate::{ListOptions, Storage, StoredFile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::file_utils::{validate_filename, STAGING_DIR_NAME};
use staging::{StageError, StagedFile};
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::AsyncRead;
use tracing::{error, info, warn};

/// Default cap on a single upload (100 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Limits applied by [`FilesystemStorage::put`]
#[derive(Debug, Clone)]
pub struct FilesystemOptions {
    /// Largest accepted upload in bytes
    pub max_upload_bytes: u64,
    /// Uploads are refused while the volume has less free space than this (0 disables the check)
    pub min_free_bytes: u64,
}

impl Default for FilesystemOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            min_free_bytes: 0,
        }
    }
}

/// Flat directory of uploaded files.
///
/// There is no index: every listing is a fresh directory scan, and the
/// filesystem itself provides the atomicity (exclusive create for staging
/// files, hard-link publish, unlink), so no lock is held around storage.
pub struct FilesystemStorage {
    resolver: PathResolver,
    staging_dir: PathBuf,
    options: FilesystemOptions,
}

impl FilesystemStorage {
    /// Open (creating if needed) the storage root and clear stale staged uploads.
    pub async fn open(data_dir: impl Into<PathBuf>, options: FilesystemOptions) -> Result<Self> {
        let data_dir = data_dir.into();
        let staging_dir = data_dir.join(STAGING_DIR_NAME);
        tokio::fs::create_dir_all(&staging_dir)
            .await
            .with_context(|| format!("Failed to create storage directory {:?}", staging_dir))?;

        let removed = staging::purge(&staging_dir)
            .await
            .context("Failed to clear staging directory")?;
        if removed > 0 {
            info!(removed, "Removed interrupted uploads from staging directory");
        }

        Ok(Self {
            resolver: PathResolver::new(data_dir),
            staging_dir,
            options,
        })
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    fn write_failure(&self, name: &str, step: &str, source: io::Error) -> StorageError {
        error!(operation = "put", name = ?name, step, error = %source, "Upload failed");
        StorageError::WriteFailure {
            name: name.to_string(),
            source,
        }
    }

    fn read_failure(&self, operation: &str, source: io::Error) -> StorageError {
        error!(operation, root = ?self.root(), error = %source, "Storage read failed");
        StorageError::ReadFailure { source }
    }

    fn check_free_space(&self, name: &str) -> StorageResult<()> {
        let required = self.options.min_free_bytes;
        if required == 0 {
            return Ok(());
        }
        match fs2::available_space(self.root()) {
            Ok(available) if available < required => Err(StorageError::QuotaExceeded {
                name: name.to_string(),
                reason: format!("only {} bytes free, {} required", available, required),
            }),
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "Failed to query free space, skipping reserve check");
                Ok(())
            }
        }
    }

    /// Metadata of `path` without following symlinks, `None` if absent
    async fn lookup(&self, path: &Path) -> io::Result<Option<Metadata>> {
        match tokio::fs::symlink_metadata(path).await {
            Ok(metadata) => Ok(Some(metadata)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Build the public view of an entry. Only regular files and directories qualify.
fn stored_file(name: String, metadata: &Metadata) -> Option<StoredFile> {
    let file_type = metadata.file_type();
    if !(file_type.is_file() || file_type.is_dir()) {
        return None;
    }
    let created_at = metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH);
    Some(StoredFile {
        name,
        size_bytes: if file_type.is_dir() { 0 } else { metadata.len() },
        created_at: DateTime::<Utc>::from(created_at),
        is_directory: file_type.is_dir(),
    })
}

#[async_trait]
impl Storage for FilesystemStorage {
    async fn put(
        &self,
        name: &str,
        content: &mut (dyn AsyncRead + Unpin + Send),
    ) -> StorageResult<StoredFile> {
        let final_path = self.resolver.resolve(name)?;

        // Fail fast before streaming; publish re-checks atomically.
        match self.lookup(&final_path).await {
            Ok(Some(_)) => return Err(StorageError::NameCollision(name.to_string())),
            Ok(None) => {}
            Err(e) => return Err(self.write_failure(name, "check existing", e)),
        }
        self.check_free_space(name)?;

        let mut staged = StagedFile::create(&self.staging_dir)
            .await
            .map_err(|e| self.write_failure(name, "create staging file", e))?;

        match staged
            .write_from(content, self.options.max_upload_bytes)
            .await
        {
            Ok(_) => {}
            Err(StageError::TooLarge { limit }) => {
                return Err(StorageError::QuotaExceeded {
                    name: name.to_string(),
                    reason: format!("larger than the {} byte upload limit", limit),
                });
            }
            Err(StageError::Io(e)) => return Err(self.write_failure(name, "write content", e)),
        }

        match staged.publish(&final_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StorageError::NameCollision(name.to_string()));
            }
            Err(e) => return Err(self.write_failure(name, "publish", e)),
        }

        if let Err(e) = staging::sync_dir(self.root()).await {
            // Not durable, so not a success: withdraw the file.
            let _ = tokio::fs::remove_file(&final_path).await;
            return Err(self.write_failure(name, "sync directory", e));
        }

        let metadata = tokio::fs::symlink_metadata(&final_path)
            .await
            .map_err(|e| self.write_failure(name, "stat published file", e))?;
        stored_file(name.to_string(), &metadata).ok_or_else(|| {
            self.write_failure(
                name,
                "stat published file",
                io::Error::other("published entry is not a regular file"),
            )
        })
    }

    async fn list_with(&self, options: ListOptions) -> StorageResult<Vec<StoredFile>> {
        let mut entries = tokio::fs::read_dir(self.root())
            .await
            .map_err(|e| self.read_failure("list", e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| self.read_failure("list", e))?
        {
            // Names the resolver would refuse cannot be addressed, so they are not listed.
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if validate_filename(name).is_err() {
                continue;
            }
            let name = name.to_owned();

            // DirEntry::metadata does not follow symlinks.
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(self.read_failure("list", e)),
            };
            if metadata.is_dir() && !options.include_directories {
                continue;
            }
            if let Some(file) = stored_file(name, &metadata) {
                files.push(file);
            }
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    async fn get(&self, name: &str) -> StorageResult<StoredFile> {
        let path = self.resolver.resolve(name)?;
        let metadata = self
            .lookup(&path)
            .await
            .map_err(|e| self.read_failure("get", e))?
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;
        stored_file(name.to_string(), &metadata)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let path = self.resolver.resolve(name)?;
        let metadata = self
            .lookup(&path)
            .await
            .map_err(|e| self.read_failure("delete", e))?
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;

        if metadata.is_dir() {
            return Err(StorageError::DeleteFailure {
                name: name.to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "is a directory"),
            });
        }
        if !metadata.is_file() {
            return Err(StorageError::NotFound(name.to_string()));
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            // Lost a race with another delete.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name.to_string()));
            }
            Err(e) => {
                error!(operation = "delete", name = ?name, error = %e, "Delete failed");
                return Err(StorageError::DeleteFailure {
                    name: name.to_string(),
                    source: e,
                });
            }
        }

        if let Err(e) = staging::sync_dir(self.root()).await {
            warn!(name = ?name, error = %e, "Failed to sync storage directory after delete");
        }
        Ok(())
    }

    async fn path_of(&self, name: &str) -> StorageResult<PathBuf> {
        let path = self.resolver.resolve(name)?;
        match self
            .lookup(&path)
            .await
            .map_err(|e| self.read_failure("path_of", e))?
        {
            Some(metadata) if metadata.is_file() => Ok(path),
            _ => Err(StorageError::NotFound(name.to_string())),
        }
    }
}
