//! Agent configuration domain types
//!
//! These entities describe what can be built. They are owned by the
//! persistent store and only read by the builder.

use serde::{Deserialize, Serialize};

/// A target agent platform/language variant
///
/// The agent type's `name` selects its working directory under the agents path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentType {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub authors: Vec<String>,
}

/// A specific output flavor of an agent type (e.g. executable vs. library)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentTypeFormat {
    pub id: i64,
    pub agent_type_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Command template with the fixed format placeholders
    pub build_command: String,
    /// Output file location, relative to the agent working directory
    pub build_location: String,
}

/// A transport module buildable for an agent type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentTransportType {
    pub id: i64,
    pub agent_type_id: i64,
    pub name: String,
    #[serde(default)]
    pub transport_type_guid: String,
    /// Command template whose placeholders are transport configuration names
    pub build_command: String,
    /// Output file location, relative to the agent working directory
    pub build_location: String,
}

/// A configured transport instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transport {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub transport_type: String,
    #[serde(default)]
    pub guid: String,
    /// JSON array of `{"Name": ..., "Value": ...}` objects, in substitution order
    pub configuration: String,
}

impl Transport {
    /// Parses the ordered configuration entries
    pub fn config_entries(&self) -> Result<Vec<TransportConfigEntry>, serde_json::Error> {
        serde_json::from_str(&self.configuration)
    }
}

/// A single named transport configuration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransportConfigEntry {
    pub name: String,
    pub value: String,
}

impl TransportConfigEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
