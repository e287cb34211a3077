//! Error types for the Forge client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Forge client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Reading the file to upload failed
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if the API rejected the build token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::ApiError { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let unauthorized = ClientError::api_error(401, "bad token");
        assert!(unauthorized.is_unauthorized());
        assert!(ClientError::api_error(403, "expired").is_unauthorized());

        let server = ClientError::api_error(503, "down");
        assert!(!server.is_unauthorized());
    }

    #[test]
    fn test_display_includes_status() {
        let err = ClientError::api_error(404, "no such payload");
        assert_eq!(err.to_string(), "API error (status 404): no such payload");
    }
}
