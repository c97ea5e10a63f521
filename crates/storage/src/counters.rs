//! Per-day upload and download counters

use crate::error::CounterError;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Source of the current local calendar date
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Totals for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounters {
    pub day: NaiveDate,
    pub uploads: u64,
    pub downloads: u64,
}

impl DailyCounters {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            uploads: 0,
            downloads: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Activity {
    Upload,
    Download,
}

/// Today's upload/download totals.
///
/// The live [`DailyCounters`] sit behind one mutex; every read and increment
/// first rolls the counters over if the clock reports a new day. The
/// superseded day is logged and dropped. Counters live in memory unless a
/// persistence file is configured; the file is written after the mutex is
/// released, and every update carries a generation so a slow writer never
/// replaces a newer file with an older snapshot.
pub struct ActivityCounters {
    clock: Arc<dyn Clock>,
    current: Mutex<DailyCounters>,
    generation: AtomicU64,
    persistence: Option<CounterFile>,
}

impl ActivityCounters {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let today = clock.today();
        Self {
            clock,
            current: Mutex::new(DailyCounters::new(today)),
            generation: AtomicU64::new(0),
            persistence: None,
        }
    }

    /// Counters that are also written to `path` after every update.
    /// A file left from earlier today is resumed; any other day starts at zero.
    pub fn with_persistence(clock: Arc<dyn Clock>, path: impl Into<PathBuf>) -> Result<Self> {
        let file = CounterFile::new(path.into());
        let today = clock.today();
        let current = match file.load()? {
            Some(saved) if saved.day == today => {
                info!(
                    uploads = saved.uploads,
                    downloads = saved.downloads,
                    "Resumed today's activity counters"
                );
                saved
            }
            _ => DailyCounters::new(today),
        };
        Ok(Self {
            clock,
            current: Mutex::new(current),
            generation: AtomicU64::new(0),
            persistence: Some(file),
        })
    }

    pub async fn record_upload(&self) -> Result<(), CounterError> {
        self.record(Activity::Upload).await
    }

    pub async fn record_download(&self) -> Result<(), CounterError> {
        self.record(Activity::Download).await
    }

    pub fn today_uploads(&self) -> u64 {
        self.lock_current().uploads
    }

    pub fn today_downloads(&self) -> u64 {
        self.lock_current().downloads
    }

    /// Copy of today's counters, read under a single lock
    pub fn today(&self) -> DailyCounters {
        *self.lock_current()
    }

    async fn record(&self, activity: Activity) -> Result<(), CounterError> {
        let (generation, snapshot) = {
            let mut current = self.lock_current();
            match activity {
                Activity::Upload => current.uploads += 1,
                Activity::Download => current.downloads += 1,
            }
            // Taken under the lock so generations follow update order
            let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
            (generation, *current)
        };
        self.persist(generation, snapshot).await
    }

    fn lock_current(&self) -> MutexGuard<'_, DailyCounters> {
        let today = self.clock.today();
        // A panic elsewhere cannot leave a half-updated pair of integers.
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.day != today {
            let previous = std::mem::replace(&mut *current, DailyCounters::new(today));
            info!(
                day = %previous.day,
                uploads = previous.uploads,
                downloads = previous.downloads,
                "Activity counters rolled over"
            );
        }
        current
    }

    async fn persist(&self, generation: u64, snapshot: DailyCounters) -> Result<(), CounterError> {
        let Some(file) = &self.persistence else {
            return Ok(());
        };
        file.save(generation, &snapshot)
            .await
            .map_err(|source| CounterError::PersistenceFailure {
                path: file.path.display().to_string(),
                source,
            })
    }
}

/// JSON file holding the live day's counters
struct CounterFile {
    path: PathBuf,
    /// Generation of the snapshot currently in `path`
    written: tokio::sync::Mutex<u64>,
}

impl CounterFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            written: tokio::sync::Mutex::new(0),
        }
    }

    fn load(&self) -> Result<Option<DailyCounters>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read counters file {:?}", self.path))
            }
        };
        match serde_json::from_str(&content) {
            Ok(saved) => Ok(Some(saved)),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Ignoring unreadable counters file");
                Ok(None)
            }
        }
    }

    /// Write to a per-generation temp file and fsync it, then rename it over
    /// the old file unless a newer generation got there first.
    async fn save(&self, generation: u64, counters: &DailyCounters) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(counters).map_err(io::Error::other)?;
        let tmp_path = tmp_path_for(&self.path, generation);
        let written = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(&json).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        // Held for the rename only
        let mut latest = self.written.lock().await;
        if *latest > generation {
            drop(latest);
            debug!(generation, "Discarding superseded counters snapshot");
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Ok(());
        }
        tokio::fs::rename(&tmp_path, &self.path).await?;
        *latest = generation;
        Ok(())
    }
}

fn tmp_path_for(path: &Path, generation: u64) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.tmp", generation));
    path.with_file_name(name)
}
