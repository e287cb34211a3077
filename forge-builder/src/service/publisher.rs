//! Artifact publishing service
//!
//! Moves a finished agent build to the shared build directory under its
//! canonical name and uploads it to the payload API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forge_client::{ArtifactClient, ClientError};
use forge_core::domain::payload::Payload;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// A payload file that reached the artifact API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedArtifact {
    pub payload_id: i64,
    /// Final location in the build directory
    pub path: PathBuf,
    /// Raw response body from the API
    pub response: String,
}

/// Errors raised while relocating or uploading an artifact
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("upload failed: {0}")]
    Upload(#[from] ClientError),
}

impl PublishError {
    fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.display().to_string(),
            source,
        }
    }
}

/// Service trait for publishing finished payloads
#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    /// Relocates `source` and uploads it for `payload`
    async fn publish(
        &self,
        source: &Path,
        payload: &Payload,
    ) -> Result<PublishedArtifact, PublishError>;
}

/// Canonical artifact name:
/// `<agentType>_<format>_<payloadName>_<yyyyMMddHHmmss><.ext>`, with the
/// timestamp rendered in UTC
pub fn artifact_file_name(payload: &Payload, source: &Path, timestamp: DateTime<Utc>) -> String {
    let extension = source
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    format!(
        "{}_{}_{}_{}{}",
        payload.agent_type.name,
        payload.agent_type_format.name,
        payload.name,
        timestamp.format("%Y%m%d%H%M%S"),
        extension
    )
}

/// Moves `from` to `to`, copying when a rename is not possible
///
/// Fails when `to` already exists; an earlier artifact is never replaced.
async fn move_file(from: &Path, to: &Path) -> Result<(), PublishError> {
    tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)
        .await
        .map_err(|e| PublishError::io("move", to, e))?;

    let moved = match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(_) => {
            debug!(
                "Rename {} -> {} failed, falling back to copy",
                from.display(),
                to.display()
            );
            copy_and_remove(from, to).await
        }
    };

    if moved.is_err() {
        let _ = tokio::fs::remove_file(to).await;
    }
    moved
}

async fn copy_and_remove(from: &Path, to: &Path) -> Result<(), PublishError> {
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| PublishError::io("move", from, e))?;
    tokio::fs::remove_file(from)
        .await
        .map_err(|e| PublishError::io("remove", from, e))?;
    Ok(())
}

/// Publishes into a local build directory and the payload HTTP API
pub struct ApiArtifactPublisher {
    client: ArtifactClient,
    build_dir: PathBuf,
}

impl ApiArtifactPublisher {
    /// Creates a new API artifact publisher
    ///
    /// # Arguments
    /// * `client` - Client for the payload API
    /// * `build_dir` - Directory finished artifacts are moved into
    pub fn new(client: ArtifactClient, build_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            build_dir: build_dir.into(),
        }
    }

    /// Moves `source` into the build directory under its canonical name
    async fn relocate(
        &self,
        source: &Path,
        payload: &Payload,
        timestamp: DateTime<Utc>,
    ) -> Result<PathBuf, PublishError> {
        tokio::fs::create_dir_all(&self.build_dir)
            .await
            .map_err(|e| PublishError::io("create", &self.build_dir, e))?;

        let destination = self
            .build_dir
            .join(artifact_file_name(payload, source, timestamp));

        info!(
            "Moving from {} to {}",
            source.display(),
            destination.display()
        );
        move_file(source, &destination).await?;
        Ok(destination)
    }
}

#[async_trait]
impl ArtifactPublisher for ApiArtifactPublisher {
    async fn publish(
        &self,
        source: &Path,
        payload: &Payload,
    ) -> Result<PublishedArtifact, PublishError> {
        let destination = self.relocate(source, payload, Utc::now()).await?;

        info!(
            "Uploading payload {} to {}/{}/file/",
            payload.id,
            self.client.base_url(),
            payload.id
        );
        let response = self
            .client
            .upload_payload_file(payload.id, &payload.build_token, &destination)
            .await?;
        info!("Upload response: {}", response);

        Ok(PublishedArtifact {
            payload_id: payload.id,
            path: destination,
            response,
        })
    }
}
