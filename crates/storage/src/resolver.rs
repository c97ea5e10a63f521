//! Maps untrusted file names onto paths inside the storage root

use common::file_utils::{validate_filename, FilenameValidationError};
use std::path::{Path, PathBuf};

/// Resolves user-supplied names to locations directly under `root`.
///
/// Every storage operation goes through [`PathResolver::resolve`], so upload,
/// fetch and delete share one set of naming rules.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, raw_name: &str) -> Result<PathBuf, FilenameValidationError> {
        validate_filename(raw_name)?;
        Ok(self.root.join(raw_name))
    }
}
