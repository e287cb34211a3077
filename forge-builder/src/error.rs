//! Build pipeline errors
//!
//! Every way a build can end early, one variant per failure point. Each
//! variant knows how it is presented in an error report.

use forge_client::ClientError;
use forge_core::domain::build::BuildStage;
use forge_core::dto::payload::RequestError;
use thiserror::Error;

use crate::repository::StoreError;
use crate::service::{CommandError, CommandOutput, PublishError};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid build request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("configuration not found: {0}")]
    ConfigNotFound(#[source] StoreError),

    #[error("invalid configuration for transport {transport}: {source}")]
    InvalidConfig {
        transport: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store error: {0}")]
    Store(#[source] StoreError),

    #[error("{stage}: build command exited with code {}", .output.exit_code)]
    BuildFailure {
        stage: BuildStage,
        output: CommandOutput,
    },

    #[error("{stage}: {source}")]
    CommandFailed {
        stage: BuildStage,
        #[source]
        source: CommandError,
    },

    #[error("{stage}: failed to {action} build output {path}: {source}")]
    OutputIo {
        stage: BuildStage,
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage}: build output {path} is empty")]
    OutputEmpty { stage: BuildStage, path: String },

    #[error("artifact I/O failed: {0}")]
    ArtifactIo(#[source] PublishError),

    #[error("upload failed: {0}")]
    Upload(#[source] ClientError),
}

impl From<PublishError> for BuildError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Upload(client) => BuildError::Upload(client),
            io => BuildError::ArtifactIo(io),
        }
    }
}

impl BuildError {
    /// Lookup failures before anything was recorded
    pub fn from_lookup(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => BuildError::ConfigNotFound(err),
            other => BuildError::Store(other),
        }
    }

    /// Whether the failure happened before a payload record was created
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            BuildError::InvalidRequest(_)
                | BuildError::ConfigNotFound(_)
                | BuildError::InvalidConfig { .. }
        )
    }

    /// Short `Message` of the error report
    pub fn report_message(&self, agent_type: &str) -> String {
        match self {
            BuildError::InvalidRequest(_)
            | BuildError::ConfigNotFound(_)
            | BuildError::InvalidConfig { .. }
            | BuildError::Store(_) => "Error resolving payload configuration".to_string(),
            BuildError::ArtifactIo(_) | BuildError::Upload(_) => {
                format!("Error uploading {} payload to API", agent_type)
            }
            _ => format!("Error building {}", agent_type),
        }
    }

    /// `Details` of the error report
    pub fn report_details(&self) -> String {
        match self {
            BuildError::BuildFailure { output, .. } => output.details(),
            other => other.to_string(),
        }
    }
}
