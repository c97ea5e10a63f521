use std::path::{Component, Path};

/// Longest file name accepted, in bytes (the common NAME_MAX).
pub const MAX_FILENAME_BYTES: usize = 255;

/// Name of the directory inside the storage root that holds in-flight uploads.
/// It can never be used as a file name.
pub const STAGING_DIR_NAME: &str = ".staging";

/// Error type for filename validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilenameValidationError {
    Empty,
    TooLong,
    ContainsNullByte,
    ContainsControlCharacter,
    ContainsPathSeparator,
    IsSpecialDirectory,
    IsReserved,
    InvalidFileName,
}

impl FilenameValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            FilenameValidationError::Empty => "Filename cannot be empty",
            FilenameValidationError::TooLong => "Filename cannot be longer than 255 bytes",
            FilenameValidationError::ContainsNullByte => "Filename cannot contain null bytes",
            FilenameValidationError::ContainsControlCharacter => {
                "Filename cannot contain control characters"
            }
            FilenameValidationError::ContainsPathSeparator => {
                "Filename cannot contain path separators (/ or \\)"
            }
            FilenameValidationError::IsSpecialDirectory => "Filename cannot be '.' or '..'",
            FilenameValidationError::IsReserved => "Filename is reserved by the server",
            FilenameValidationError::InvalidFileName => {
                "Invalid filename: must be a single plain file name"
            }
        }
    }
}

impl std::fmt::Display for FilenameValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for FilenameValidationError {}

/// Validate an untrusted file name before it is joined onto the storage root.
///
/// Accepts only a single plain path component:
/// - not empty and at most [`MAX_FILENAME_BYTES`] bytes
/// - no null bytes or other control characters
/// - no path separators (/, \)
/// - not "." or ".."
/// - no root or drive prefix (`Path::components` must yield exactly one normal component)
/// - not the staging directory name
pub fn validate_filename(filename: &str) -> Result<(), FilenameValidationError> {
    if filename.is_empty() {
        return Err(FilenameValidationError::Empty);
    }

    if filename.len() > MAX_FILENAME_BYTES {
        return Err(FilenameValidationError::TooLong);
    }

    if filename.contains('\0') {
        return Err(FilenameValidationError::ContainsNullByte);
    }

    if filename.chars().any(char::is_control) {
        return Err(FilenameValidationError::ContainsControlCharacter);
    }

    if filename.contains('/') || filename.contains('\\') {
        return Err(FilenameValidationError::ContainsPathSeparator);
    }

    if filename == "." || filename == ".." {
        return Err(FilenameValidationError::IsSpecialDirectory);
    }

    if filename == STAGING_DIR_NAME {
        return Err(FilenameValidationError::IsReserved);
    }

    // Catches drive prefixes such as "C:name" on Windows, and anything the
    // platform would normalize into something other than the input.
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name.to_str() == Some(filename) => Ok(()),
        _ => Err(FilenameValidationError::InvalidFileName),
    }
}
