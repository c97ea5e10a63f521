//! Read-only admin dashboard data

use crate::counters::ActivityCounters;
use crate::{Storage, StoredFile};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::warn;

/// Recent log output, supplied by whoever owns the log file
#[async_trait]
pub trait LogSource: Send + Sync {
    /// At most `max_lines` of the most recent lines, oldest first
    async fn tail(&self, max_lines: usize) -> Result<Vec<String>>;
}

pub const DEFAULT_LOG_TAIL_LINES: usize = 200;

/// Part names reported in [`AdminSnapshot::degraded`]
pub const PART_FILES: &str = "files";
pub const PART_LOG_TAIL: &str = "log_tail";

#[derive(Debug, Clone)]
pub struct AdminSnapshot {
    pub day: NaiveDate,
    pub uploads_today: u64,
    pub downloads_today: u64,
    pub log_tail: Vec<String>,
    pub files: Vec<StoredFile>,
    /// Parts that failed to load and were left empty
    pub degraded: Vec<&'static str>,
}

/// Builds [`AdminSnapshot`]s. A failing part is left empty and named in
/// `degraded`; the snapshot itself never fails.
pub struct AdminViewAssembler {
    storage: Arc<dyn Storage>,
    counters: Arc<ActivityCounters>,
    logs: Arc<dyn LogSource>,
    log_tail_lines: usize,
}

impl AdminViewAssembler {
    pub fn new(
        storage: Arc<dyn Storage>,
        counters: Arc<ActivityCounters>,
        logs: Arc<dyn LogSource>,
        log_tail_lines: usize,
    ) -> Self {
        Self {
            storage,
            counters,
            logs,
            log_tail_lines,
        }
    }

    pub async fn snapshot(&self) -> AdminSnapshot {
        let mut degraded = Vec::new();

        let (files, log_tail) =
            tokio::join!(self.storage.list(), self.logs.tail(self.log_tail_lines));

        let files = files.unwrap_or_else(|e| {
            warn!(error = %e, "Admin snapshot without file listing");
            degraded.push(PART_FILES);
            Vec::new()
        });
        let log_tail = log_tail.unwrap_or_else(|e| {
            warn!(error = %e, "Admin snapshot without log tail");
            degraded.push(PART_LOG_TAIL);
            Vec::new()
        });

        let today = self.counters.today();
        AdminSnapshot {
            day: today.day,
            uploads_today: today.uploads,
            downloads_today: today.downloads,
            log_tail,
            files,
            degraded,
        }
    }
}
