pub mod counters;
pub mod error;
pub mod filesystem;
pub mod link;
pub mod resolver;
pub mod snapshot;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::AsyncRead;

pub use counters::{ActivityCounters, Clock, DailyCounters, LocalClock};
pub use error::{CounterError, StorageError, StorageResult};
pub use filesystem::{FilesystemOptions, FilesystemStorage};
pub use link::LinkGenerator;
pub use resolver::PathResolver;
pub use snapshot::{AdminSnapshot, AdminViewAssembler, LogSource};

/// A file held by the store. Identity is the name; entries are never
/// modified in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub is_directory: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    /// Also report directories found under the root (flagged with `is_directory`)
    pub include_directories: bool,
}

/// Storage backend trait for uploaded files
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream `content` into a new file called `name`.
    /// Existing names are rejected, never overwritten. The file is durable
    /// and visible to every later `list`/`get` once this returns `Ok`.
    async fn put(
        &self,
        name: &str,
        content: &mut (dyn AsyncRead + Unpin + Send),
    ) -> StorageResult<StoredFile>;

    /// All regular files, sorted by name
    async fn list(&self) -> StorageResult<Vec<StoredFile>> {
        self.list_with(ListOptions::default()).await
    }

    async fn list_with(&self, options: ListOptions) -> StorageResult<Vec<StoredFile>>;

    async fn get(&self, name: &str) -> StorageResult<StoredFile>;

    /// Permanently remove a file
    async fn delete(&self, name: &str) -> StorageResult<()>;

    /// On-disk location of a stored file, for streaming it back out
    async fn path_of(&self, name: &str) -> StorageResult<PathBuf>;
}
