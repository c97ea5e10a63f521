//! Shareable URLs for stored files
//!
//! Links are plain bearer URLs: anyone holding one can fetch the file. They
//! carry no secret, so they are only as hard to guess as the file name.

use crate::StoredFile;

/// Path prefix under which stored files are served
pub const UPLOADS_MOUNT: &str = "/uploads";

pub const DEFAULT_SCHEME: &str = "http";

#[derive(Debug, Clone)]
pub struct LinkGenerator {
    scheme: String,
}

impl Default for LinkGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEME)
    }
}

impl LinkGenerator {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Absolute URL for `file` as reached through `request_host` (host[:port]).
    /// Same inputs, same output.
    pub fn direct_link(&self, request_host: &str, file: &StoredFile) -> String {
        format!(
            "{}://{}{}",
            self.scheme,
            request_host.trim_end_matches('/'),
            self.relative_link(file)
        )
    }

    /// Host-relative URL, e.g. `/uploads/report.pdf`
    pub fn relative_link(&self, file: &StoredFile) -> String {
        format!("{}/{}", UPLOADS_MOUNT, urlencoding::encode(&file.name))
    }
}
