use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by the storage adapter and the path resolver.
///
/// Failures during a tree build never surface as a `DriveError`; they are
/// recorded on the affected node instead.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Remote API error {status}: {message}")]
    RemoteApi { status: u16, message: String },

    #[error("Entry with ID {id} not found")]
    NotFound { id: String },

    #[error("Invalid folder path: {reason}")]
    InvalidPath { reason: String },

    #[error("Invalid drive configuration: {details}")]
    Config { details: String },

    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DriveError {
    pub fn remote_api<S: Into<String>>(status: u16, message: S) -> Self {
        Self::RemoteApi { status, message: message.into() }
    }

    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn invalid_path<S: Into<String>>(reason: S) -> Self {
        Self::InvalidPath { reason: reason.into() }
    }

    pub fn config<S: Into<String>>(details: S) -> Self {
        Self::Config { details: details.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DriveError::NotFound { .. })
    }

    /// Status the HTTP layer should answer with when this error reaches it
    pub fn status_code(&self) -> StatusCode {
        match self {
            DriveError::NotFound { .. } => StatusCode::NOT_FOUND,
            DriveError::InvalidPath { .. } => StatusCode::BAD_REQUEST,
            DriveError::RemoteApi { .. } => StatusCode::BAD_GATEWAY,
            DriveError::Transport(_) => StatusCode::BAD_GATEWAY,
            DriveError::Decode(_) => StatusCode::BAD_GATEWAY,
            DriveError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable code for frontend handling
    pub fn error_code(&self) -> &'static str {
        match self {
            DriveError::RemoteApi { .. } => "DRIVE_REMOTE_API_ERROR",
            DriveError::NotFound { .. } => "DRIVE_ENTRY_NOT_FOUND",
            DriveError::InvalidPath { .. } => "DRIVE_INVALID_PATH",
            DriveError::Config { .. } => "DRIVE_CONFIG_INVALID",
            DriveError::Transport(_) => "DRIVE_TRANSPORT_ERROR",
            DriveError::Decode(_) => "DRIVE_DECODE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(DriveError::not_found("abc").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(DriveError::invalid_path("empty").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(DriveError::remote_api(500, "boom").status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(DriveError::config("no token").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_codes_and_messages() {
        let err = DriveError::remote_api(403, "Rate Limit Exceeded");
        assert_eq!(err.error_code(), "DRIVE_REMOTE_API_ERROR");
        assert_eq!(err.to_string(), "Remote API error 403: Rate Limit Exceeded");

        let err = DriveError::not_found("file-9");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Entry with ID file-9 not found");

        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(DriveError::from(decode).error_code(), "DRIVE_DECODE_ERROR");
    }
}
