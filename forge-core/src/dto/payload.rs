//! Payload DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request to build a new payload
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewPayload {
    pub agent_type_id: i64,
    pub agent_type_format_id: i64,
    pub agent_transport_type_id: i64,
    pub transport_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub jitter: f64,
    pub beacon_interval: u32,
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    pub build_token: String,
}

/// Reasons a build request is rejected before anything is recorded
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("payload name cannot be empty")]
    EmptyName,

    #[error("payload name contains disallowed character {0:?}")]
    InvalidNameCharacter(char),

    #[error("jitter must be a finite, non-negative number (got {0})")]
    InvalidJitter(f64),
}

impl NewPayload {
    /// Checks the values that get substituted into build command lines
    ///
    /// The name is spliced into a shell command verbatim, so it is limited to
    /// ASCII letters, digits, `_`, `-` and `.`.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.name.is_empty() {
            return Err(RequestError::EmptyName);
        }

        if let Some(c) = self
            .name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(RequestError::InvalidNameCharacter(c));
        }

        if !self.jitter.is_finite() || self.jitter < 0.0 {
            return Err(RequestError::InvalidJitter(self.jitter));
        }

        Ok(())
    }
}

impl std::fmt::Debug for NewPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewPayload")
            .field("agent_type_id", &self.agent_type_id)
            .field("agent_type_format_id", &self.agent_type_format_id)
            .field("agent_transport_type_id", &self.agent_transport_type_id)
            .field("transport_id", &self.transport_id)
            .field("name", &self.name)
            .field("jitter", &self.jitter)
            .field("beacon_interval", &self.beacon_interval)
            .field("expiration_date", &self.expiration_date)
            .field("build_token", &"<redacted>")
            .finish()
    }
}
