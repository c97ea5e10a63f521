/// Default directory holding uploaded files
pub const DEFAULT_DATA_DIR: &str = "uploads";

/// Default log file; also the source of the admin log tail
pub const DEFAULT_LOG_FILE: &str = "app.log";

/// Default server host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_PORT: u16 = 8080;

/// Default admin user name (the password has no default)
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Default bound on bytes read from the end of the log file (64 KiB)
pub const DEFAULT_LOG_TAIL_MAX_BYTES: u64 = 64 * 1024;

/// Largest accepted log tail window (64 MiB); the window is read into memory
pub const MAX_LOG_TAIL_MAX_BYTES: u64 = 64 * 1024 * 1024;

/// Multipart field carrying the uploaded file
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Chunks buffered between the request body and the storage writer
pub const UPLOAD_BRIDGE_CAPACITY: usize = 8;

/// Basic auth challenge sent on 401 responses
pub const AUTH_CHALLENGE: &str = r#"Basic realm="Authorization Required""#;

pub const ENV_CONFIG: &str = "SERVER_CONFIG";
pub const ENV_HOST: &str = "SERVER_HOST";
pub const ENV_PORT: &str = "SERVER_PORT";
pub const ENV_DATA_DIR: &str = "DATA_DIR";
pub const ENV_LOG_FILE: &str = "LOG_FILE";
pub const ENV_COUNTERS_FILE: &str = "COUNTERS_FILE";
pub const ENV_ADMIN_USERNAME: &str = "ADMIN_USERNAME";
pub const ENV_ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
pub const ENV_PUBLIC_HOST: &str = "PUBLIC_HOST";
