use crate::constants::{
    DEFAULT_ADMIN_USERNAME, DEFAULT_DATA_DIR, DEFAULT_HOST, DEFAULT_LOG_FILE,
    DEFAULT_LOG_TAIL_MAX_BYTES, DEFAULT_PORT, ENV_ADMIN_PASSWORD, ENV_ADMIN_USERNAME,
    ENV_CONFIG, ENV_COUNTERS_FILE, ENV_DATA_DIR, ENV_HOST, ENV_LOG_FILE, ENV_PORT,
    ENV_PUBLIC_HOST, MAX_LOG_TAIL_MAX_BYTES,
};
use anyhow::{bail, Context, Result};
use clap::{Arg, ArgMatches, Command};
use serde::Deserialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use storage::filesystem::DEFAULT_MAX_UPLOAD_BYTES;
use storage::link::DEFAULT_SCHEME;
use storage::snapshot::DEFAULT_LOG_TAIL_LINES;

/// Server configuration.
///
/// Each value comes from the first source that sets it: command line,
/// environment, config file (`--config`, TOML), built-in default.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding uploaded files
    pub data_dir: PathBuf,
    /// Log file written by the server and tailed by the admin view
    pub log_file: PathBuf,
    /// Where today's activity counters are persisted; in-memory only when unset
    pub counters_file: Option<PathBuf>,
    pub admin_username: String,
    /// Admin routes reject every request when unset
    pub admin_password: Option<String>,
    pub max_upload_bytes: u64,
    /// Free space the storage volume must keep; uploads are refused below it
    pub min_free_bytes: u64,
    /// Scheme used in direct links
    pub link_scheme: String,
    /// Host used in direct links instead of the request's Host header
    pub public_host: Option<String>,
    pub log_tail_lines: usize,
    pub log_tail_max_bytes: u64,
    pub workers: Option<usize>,
}

/// Optional TOML settings file. The admin login keys are `username` and
/// `password`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
    counters_file: Option<PathBuf>,
    username: Option<String>,
    password: Option<String>,
    max_upload_bytes: Option<u64>,
    min_free_bytes: Option<u64>,
    link_scheme: Option<String>,
    public_host: Option<String>,
    log_tail_lines: Option<usize>,
    log_tail_max_bytes: Option<u64>,
    workers: Option<usize>,
}

impl FileConfig {
    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        let matches = Self::command().get_matches();
        Self::from_sources(&matches, |key| std::env::var(key).ok())
    }

    pub fn command() -> Command {
        Command::new("server")
            .about("Self-hosted file sharing server")
            .arg(
                Arg::new("config")
                    .long("config")
                    .value_name("FILE")
                    .help("TOML config file (or SERVER_CONFIG env var)"),
            )
            .arg(
                Arg::new("host")
                    .long("host")
                    .value_name("HOST")
                    .help("Server host (default: 0.0.0.0, or SERVER_HOST env var)"),
            )
            .arg(
                Arg::new("port")
                    .long("port")
                    .value_name("PORT")
                    .help("Server port (default: 8080, or SERVER_PORT env var)"),
            )
            .arg(
                Arg::new("data-dir")
                    .long("data-dir")
                    .value_name("DIR")
                    .help("Directory for uploaded files (default: uploads, or DATA_DIR env var)"),
            )
            .arg(
                Arg::new("log-file")
                    .long("log-file")
                    .value_name("FILE")
                    .help("Log file shown in the admin view (default: app.log, or LOG_FILE env var)"),
            )
            .arg(
                Arg::new("counters-file")
                    .long("counters-file")
                    .value_name("FILE")
                    .help("Persist daily counters to this JSON file (or COUNTERS_FILE env var)"),
            )
            .arg(
                Arg::new("max-upload-bytes")
                    .long("max-upload-bytes")
                    .value_name("BYTES")
                    .help("Largest accepted upload (default: 100 MiB)"),
            )
            .arg(
                Arg::new("min-free-bytes")
                    .long("min-free-bytes")
                    .value_name("BYTES")
                    .help("Refuse uploads when the volume has less free space (default: 0, disabled)"),
            )
            .arg(
                Arg::new("link-scheme")
                    .long("link-scheme")
                    .value_name("SCHEME")
                    .help("Scheme used in direct links: http or https (default: http)"),
            )
            .arg(
                Arg::new("public-host")
                    .long("public-host")
                    .value_name("HOST")
                    .help("Host used in direct links instead of the request Host header (or PUBLIC_HOST env var)"),
            )
            .arg(
                Arg::new("log-tail-lines")
                    .long("log-tail-lines")
                    .value_name("LINES")
                    .help("Log lines shown in the admin view (default: 200)"),
            )
            .arg(
                Arg::new("log-tail-bytes")
                    .long("log-tail-bytes")
                    .value_name("BYTES")
                    .help("Bytes read from the end of the log file (default: 65536)"),
            )
            .arg(
                Arg::new("workers")
                    .long("workers")
                    .value_name("N")
                    .help("HTTP worker threads (default: one per CPU)"),
            )
    }

    fn from_sources(matches: &ArgMatches, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let arg = |id: &str| matches.get_one::<String>(id).cloned();
        let arg_or_env = |id: &str, key: &str| arg(id).or_else(|| env(key));

        let file = match arg_or_env("config", ENV_CONFIG) {
            Some(path) => FileConfig::read(Path::new(&path))?,
            None => FileConfig::default(),
        };

        let host = arg_or_env("host", ENV_HOST)
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_value("port", arg_or_env("port", ENV_PORT))?
            .or(file.port)
            .unwrap_or(DEFAULT_PORT);
        let data_dir = arg_or_env("data-dir", ENV_DATA_DIR)
            .map(PathBuf::from)
            .or(file.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let log_file = arg_or_env("log-file", ENV_LOG_FILE)
            .map(PathBuf::from)
            .or(file.log_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        let counters_file = arg_or_env("counters-file", ENV_COUNTERS_FILE)
            .map(PathBuf::from)
            .or(file.counters_file);
        let admin_username = env(ENV_ADMIN_USERNAME)
            .or(file.username)
            .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());
        let admin_password = env(ENV_ADMIN_PASSWORD)
            .or(file.password)
            .filter(|p| !p.is_empty());
        let max_upload_bytes = parse_value("max-upload-bytes", arg("max-upload-bytes"))?
            .or(file.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        let min_free_bytes = parse_value("min-free-bytes", arg("min-free-bytes"))?
            .or(file.min_free_bytes)
            .unwrap_or(0);
        let link_scheme = arg("link-scheme")
            .or(file.link_scheme)
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string());
        let public_host = arg_or_env("public-host", ENV_PUBLIC_HOST).or(file.public_host);
        let log_tail_lines = parse_value("log-tail-lines", arg("log-tail-lines"))?
            .or(file.log_tail_lines)
            .unwrap_or(DEFAULT_LOG_TAIL_LINES);
        let log_tail_max_bytes = parse_value("log-tail-bytes", arg("log-tail-bytes"))?
            .or(file.log_tail_max_bytes)
            .unwrap_or(DEFAULT_LOG_TAIL_MAX_BYTES);
        let workers = parse_value("workers", arg("workers"))?.or(file.workers);

        if link_scheme != "http" && link_scheme != "https" {
            bail!("Invalid link scheme: {}. Must be 'http' or 'https'", link_scheme);
        }
        if max_upload_bytes == 0 {
            bail!("max-upload-bytes must be greater than 0");
        }
        if log_tail_lines == 0 || log_tail_max_bytes == 0 {
            bail!("log tail bounds must be greater than 0");
        }
        if log_tail_max_bytes > MAX_LOG_TAIL_MAX_BYTES {
            bail!(
                "log-tail-bytes must be at most {} (got {})",
                MAX_LOG_TAIL_MAX_BYTES,
                log_tail_max_bytes
            );
        }
        if workers == Some(0) {
            bail!("workers must be greater than 0");
        }

        Ok(ServerConfig {
            host,
            port,
            data_dir,
            log_file,
            counters_file,
            admin_username,
            admin_password,
            max_upload_bytes,
            min_free_bytes,
            link_scheme,
            public_host,
            log_tail_lines,
            log_tail_max_bytes,
            workers,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_value<T>(name: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    raw.map(|value| {
        value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", name, value, e))
    })
    .transpose()
}
