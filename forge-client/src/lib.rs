//! Forge HTTP Client
//!
//! A small HTTP client for the payload artifact API.
//!
//! The builder uses it to upload finished payload files. Each upload is
//! authenticated with the payload's opaque build token.
//!
//! # Example
//!
//! ```no_run
//! use forge_client::ArtifactClient;
//!
//! #[tokio::main]
//! async fn main() -> forge_client::Result<()> {
//!     let client = ArtifactClient::new("http://api:5000/api/v1/payload");
//!
//!     let response = client
//!         .upload_payload_file(42, "build-token", std::path::Path::new("build/agent.exe"))
//!         .await?;
//!
//!     println!("API replied: {}", response);
//!     Ok(())
//! }
//! ```

pub mod error;
mod payloads;

pub use error::{ClientError, Result};

use reqwest::Client;

/// HTTP client for the payload artifact API
#[derive(Debug, Clone)]
pub struct ArtifactClient {
    /// Base URL of the payload API (e.g., "http://api:5000/api/v1/payload")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl ArtifactClient {
    /// Create a new artifact client
    ///
    /// # Example
    /// ```
    /// use forge_client::ArtifactClient;
    ///
    /// let client = ArtifactClient::new("http://api:5000/api/v1/payload");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new artifact client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the payload API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks the status code and returns the body as opaque text
    async fn handle_text_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ArtifactClient::new("http://api:5000/api/v1/payload");
        assert_eq!(client.base_url(), "http://api:5000/api/v1/payload");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ArtifactClient::new("http://api:5000/api/v1/payload/");
        assert_eq!(client.base_url(), "http://api:5000/api/v1/payload");
    }

    #[test]
    fn test_client_with_custom_client() {
        let client = ArtifactClient::with_client("http://localhost:5000", Client::new());
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
