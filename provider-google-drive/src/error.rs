//! Error types for the Google Drive provider

use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// Operation attempted before `initialize` bound an account
    #[error("Drive connector not initialized")]
    NotInitialized,

    /// API request returned an error
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Transport error from the HTTP layer
    #[error(transparent)]
    BridgeError(#[from] mellow_bridge::error::BridgeError),
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;

impl From<GoogleDriveError> for mellow_bridge::error::BridgeError {
    fn from(error: GoogleDriveError) -> Self {
        match error {
            GoogleDriveError::NotInitialized => {
                mellow_bridge::error::BridgeError::NotAvailable(
                    "Drive connector not initialized".to_string(),
                )
            }
            GoogleDriveError::ApiError {
                status_code,
                message,
            } => mellow_bridge::error::BridgeError::OperationFailed(format!(
                "API error (status {}): {}",
                status_code, message
            )),
            GoogleDriveError::ParseError(msg) => {
                mellow_bridge::error::BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            GoogleDriveError::BridgeError(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GoogleDriveError::ApiError {
            status_code: 404,
            message: "File not found".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Google Drive API error (status 404): File not found"
        );
    }

    #[test]
    fn test_not_initialized_conversion() {
        let error = GoogleDriveError::NotInitialized;
        let bridge_error: mellow_bridge::error::BridgeError = error.into();

        assert!(matches!(
            bridge_error,
            mellow_bridge::error::BridgeError::NotAvailable(_)
        ));
    }
}
