pub mod file_utils;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A stored file as returned by the HTTP API
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub is_directory: bool,
    pub url: String, // relative for listings, absolute for detail views
}

/// Response to a successful upload
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UploadResponse {
    pub file: FileInfo,
    pub direct_link: String,
}

/// Response from the public listing endpoint
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FileListResponse {
    pub files: Vec<FileInfo>, // sorted by name
}

/// Response to a successful delete
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DeleteResponse {
    pub deleted: String,
}

/// Admin dashboard data
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AdminSnapshotResponse {
    pub day: NaiveDate,
    pub uploads_today: u64,
    pub downloads_today: u64,
    pub log_tail: Vec<String>, // oldest first
    pub files: Vec<FileInfo>,
    /// Parts of the snapshot that could not be loaded and were left empty
    pub degraded: Vec<String>,
}

/// Response from health check endpoint
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String, // "ok" when healthy
}
