use actix_web::error::{
    ErrorBadRequest, ErrorInternalServerError, ErrorNotFound, ErrorPayloadTooLarge,
};
use storage::StorageError;
use tracing::error;

/// Helper function for bad request errors
pub fn handle_error<E: std::fmt::Display>(msg: &str, e: E) -> actix_web::Error {
    error!("{}: {}", msg, e);
    ErrorBadRequest(format!("{}: {}", msg, e))
}

/// Helper function for server errors
pub fn handle_server_error<E: std::fmt::Display>(msg: &str, e: E) -> actix_web::Error {
    error!("{}: {}", msg, e);
    ErrorInternalServerError(format!("{}: {}", msg, e))
}

/// Map a storage failure to its HTTP status. Client errors echo the reason;
/// I/O failures were already logged by the store and get a generic body.
pub fn handle_storage_error(e: StorageError) -> actix_web::Error {
    match e {
        StorageError::InvalidName(reason) => ErrorBadRequest(format!("Invalid filename: {}", reason)),
        StorageError::NameCollision(_) => ErrorBadRequest(e.to_string()),
        StorageError::NotFound(_) => ErrorNotFound(e.to_string()),
        StorageError::QuotaExceeded { .. } => ErrorPayloadTooLarge(e.to_string()),
        StorageError::WriteFailure { .. } => ErrorInternalServerError("Failed to store file"),
        StorageError::DeleteFailure { .. } => ErrorInternalServerError("Failed to delete file"),
        StorageError::ReadFailure { .. } => ErrorInternalServerError("Failed to read storage"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use common::file_utils::FilenameValidationError;
    use std::io;

    fn status(e: StorageError) -> StatusCode {
        handle_storage_error(e).as_response_error().status_code()
    }

    #[test]
    fn maps_storage_errors_to_statuses() {
        assert_eq!(
            status(StorageError::InvalidName(FilenameValidationError::IsSpecialDirectory)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(StorageError::NameCollision("a".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(StorageError::NotFound("a".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status(StorageError::QuotaExceeded {
                name: "a".into(),
                reason: "too big".into()
            }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status(StorageError::ReadFailure {
                source: io::Error::new(io::ErrorKind::Other, "disk")
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
