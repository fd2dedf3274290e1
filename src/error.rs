//! Error types for the drive_mirror crate.

use thiserror::Error;

/// Errors that can occur while mirroring a Google Drive folder.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    CredentialsParseError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    #[error("Invalid URL or ID: {0}")]
    InvalidUrlOrId(String),

    #[error("JWT encoding error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),

    #[error("Provided ID is not a folder: {id} ({mime_type})")]
    NotAFolder { id: String, mime_type: String },

    #[error("Transfer of {id} failed after {attempts} attempts: {last}")]
    TransferExhausted {
        id: String,
        attempts: u32,
        last: Box<DriveError>,
    },

    #[error("Failed to list folder {folder_id}: {source}")]
    ListingFailed {
        folder_id: String,
        #[source]
        source: Box<DriveError>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DriveError {
    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DriveError::ApiError { status, .. } => Some(*status),
            DriveError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Machine-readable reason attached to an API error.
    pub fn reason(&self) -> Option<&str> {
        match self {
            DriveError::ApiError { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;
