//! Log setup and the log tail shown in the admin view

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::LogSource;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,actix_server::worker=warn,actix_server::accept=warn";

/// Log to stderr and append to `log_file`. `RUST_LOG` overrides the
/// default filter.
pub fn init(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {:?}", parent))?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {:?}", log_file))?;
    let writer = std::io::stderr.and(Arc::new(file));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Reads the last lines of the server log, looking at no more than
/// `max_bytes` from the end of the file.
pub struct LogFileTail {
    path: PathBuf,
    max_bytes: u64,
}

impl LogFileTail {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            path: path.into(),
            max_bytes,
        }
    }
}

#[async_trait]
impl LogSource for LogFileTail {
    async fn tail(&self, max_lines: usize) -> Result<Vec<String>> {
        let mut file = File::open(&self.path)
            .await
            .with_context(|| format!("Failed to open log file {:?}", self.path))?;
        let len = file.metadata().await?.len();

        // One byte before the window tells whether it starts on a line boundary
        let window = self.max_bytes.saturating_add(1);
        let start = len.saturating_sub(window);
        file.seek(SeekFrom::Start(start)).await?;

        let mut buf = Vec::new();
        file.take(window).read_to_end(&mut buf).await?;

        let window = if start > 0 {
            match buf.iter().position(|&b| b == b'\n') {
                Some(newline) => &buf[newline + 1..],
                None => &buf[buf.len()..],
            }
        } else {
            &buf[..]
        };

        Ok(last_lines(window, max_lines))
    }
}

fn last_lines(bytes: &[u8], max_lines: usize) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(max_lines);
    lines[skip..].iter().map(|line| line.to_string()).collect()
}
