//! Payload artifact endpoints

use std::path::Path;

use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::ArtifactClient;
use crate::error::{ClientError, Result};

/// Header carrying the per-build authentication token
pub const BUILD_TOKEN_HEADER: &str = "build-token";

impl ArtifactClient {
    /// Upload a built payload file
    ///
    /// Sends `POST <base_url>/<payload_id>/file/` with the file as the `file`
    /// multipart field and the token in the `build-token` header.
    ///
    /// # Returns
    /// The raw response body, treated as opaque text
    pub async fn upload_payload_file(
        &self,
        payload_id: i64,
        build_token: &str,
        path: &Path,
    ) -> Result<String> {
        let url = format!("{}/{}/file/", self.base_url, payload_id);

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::FileRead {
                path: path.display().to_string(),
                source,
            })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "payload".to_string());

        debug!(
            "Uploading {} ({} bytes) to {}",
            file_name,
            bytes.len(),
            url
        );

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .header(BUILD_TOKEN_HEADER, build_token)
            .multipart(form)
            .send()
            .await?;

        self.handle_text_response(response).await
    }
}
