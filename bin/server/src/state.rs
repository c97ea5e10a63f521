//! Server application state

use crate::auth::AdminCredentials;
use crate::config::ServerConfig;
use crate::logging::LogFileTail;
use actix_web::HttpRequest;
use anyhow::{Context, Result};
use common::FileInfo;
use std::sync::Arc;
use storage::{
    ActivityCounters, AdminViewAssembler, FilesystemOptions, FilesystemStorage, LinkGenerator,
    LocalClock, LogSource, Storage, StoredFile,
};
use tracing::info;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub counters: Arc<ActivityCounters>,
    pub links: LinkGenerator,
    pub admin_view: AdminViewAssembler,
    /// `None` disables every admin route
    pub credentials: Option<AdminCredentials>,
    /// Overrides the request host in direct links
    pub public_host: Option<String>,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn Storage>,
        counters: Arc<ActivityCounters>,
        logs: Arc<dyn LogSource>,
        log_tail_lines: usize,
    ) -> Self {
        let admin_view =
            AdminViewAssembler::new(storage.clone(), counters.clone(), logs, log_tail_lines);
        Self {
            storage,
            counters,
            links: LinkGenerator::default(),
            admin_view,
            credentials: None,
            public_host: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Option<AdminCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_links(mut self, links: LinkGenerator, public_host: Option<String>) -> Self {
        self.links = links;
        self.public_host = public_host;
        self
    }

    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        let options = FilesystemOptions {
            max_upload_bytes: config.max_upload_bytes,
            min_free_bytes: config.min_free_bytes,
        };
        let storage = FilesystemStorage::open(&config.data_dir, options)
            .await
            .with_context(|| format!("Failed to open storage at {:?}", config.data_dir))?;
        info!("Using filesystem storage: {:?}", storage.root());

        let clock = Arc::new(LocalClock);
        let counters = match &config.counters_file {
            Some(path) => {
                info!("Persisting daily counters to {:?}", path);
                ActivityCounters::with_persistence(clock, path)?
            }
            None => ActivityCounters::new(clock),
        };

        let logs = LogFileTail::new(&config.log_file, config.log_tail_max_bytes);
        let credentials = config
            .admin_password
            .as_deref()
            .map(|password| AdminCredentials::new(&config.admin_username, password));

        Ok(Self::new(
            Arc::new(storage),
            Arc::new(counters),
            Arc::new(logs),
            config.log_tail_lines,
        )
        .with_credentials(credentials)
        .with_links(
            LinkGenerator::new(config.link_scheme.clone()),
            config.public_host.clone(),
        ))
    }

    /// Host used when building absolute links for this request
    pub fn link_host(&self, req: &HttpRequest) -> String {
        match &self.public_host {
            Some(host) => host.clone(),
            None => req.connection_info().host().to_string(),
        }
    }

    /// Listing entry with a link relative to this server
    pub fn file_info(&self, file: &StoredFile) -> FileInfo {
        FileInfo {
            name: file.name.clone(),
            size_bytes: file.size_bytes,
            created_at: file.created_at,
            is_directory: file.is_directory,
            url: self.links.relative_link(file),
        }
    }

    /// Detail entry with an absolute direct link
    pub fn file_detail(&self, req: &HttpRequest, file: &StoredFile) -> FileInfo {
        FileInfo {
            url: self.links.direct_link(&self.link_host(req), file),
            ..self.file_info(file)
        }
    }
}
