//! Payload store
//!
//! Lookups of agent configuration entities and insertion of payload records.

use async_trait::async_trait;
use forge_core::domain::agent::{AgentTransportType, AgentType, AgentTypeFormat, Transport};
use forge_core::domain::payload::Payload;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Errors returned by a payload store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("failed to load catalog {path}: {message}")]
    Catalog { path: String, message: String },
}

/// Repository trait for the persistent store
#[async_trait]
pub trait PayloadStore: Send + Sync {
    async fn get_agent_type(&self, id: i64) -> Result<AgentType, StoreError>;

    async fn get_agent_type_format(&self, id: i64) -> Result<AgentTypeFormat, StoreError>;

    async fn get_agent_transport_type(&self, id: i64) -> Result<AgentTransportType, StoreError>;

    async fn get_transport(&self, id: i64) -> Result<Transport, StoreError>;

    /// Persists a new payload record
    ///
    /// # Returns
    /// The stored record with its assigned id
    async fn add(&self, payload: Payload) -> Result<Payload, StoreError>;

    /// Marks a payload as successfully built
    async fn mark_built(&self, payload_id: i64) -> Result<(), StoreError>;
}

/// Agent configuration entities known to the builder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Catalog {
    #[serde(default)]
    pub agent_types: Vec<AgentType>,
    #[serde(default)]
    pub agent_type_formats: Vec<AgentTypeFormat>,
    #[serde(default)]
    pub agent_transport_types: Vec<AgentTransportType>,
    #[serde(default)]
    pub transports: Vec<Transport>,
}

/// In-memory store seeded from a JSON catalog
///
/// Payload records live for the lifetime of the process and get
/// incremental ids starting at 1.
pub struct CatalogStore {
    catalog: Catalog,
    payloads: Mutex<Vec<Payload>>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            payloads: Mutex::new(Vec::new()),
        }
    }

    /// Loads the catalog from a JSON file
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let catalog_error = |message: String| StoreError::Catalog {
            path: path.display().to_string(),
            message,
        };

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| catalog_error(e.to_string()))?;
        let catalog: Catalog =
            serde_json::from_str(&contents).map_err(|e| catalog_error(e.to_string()))?;

        info!(
            "Loaded catalog: {} agent type(s), {} format(s), {} transport type(s), {} transport(s)",
            catalog.agent_types.len(),
            catalog.agent_type_formats.len(),
            catalog.agent_transport_types.len(),
            catalog.transports.len()
        );

        Ok(Self::new(catalog))
    }

    /// Returns a snapshot of a stored payload
    #[allow(dead_code)]
    pub async fn payload(&self, payload_id: i64) -> Option<Payload> {
        let payloads = self.payloads.lock().await;
        payloads.iter().find(|p| p.id == payload_id).cloned()
    }

    /// Number of stored payload records
    #[allow(dead_code)]
    pub async fn payload_count(&self) -> usize {
        self.payloads.lock().await.len()
    }
}

fn find<T: Clone>(
    items: &[T],
    entity: &'static str,
    id: i64,
    key: impl Fn(&T) -> i64,
) -> Result<T, StoreError> {
    items
        .iter()
        .find(|item| key(item) == id)
        .cloned()
        .ok_or(StoreError::NotFound { entity, id })
}

#[async_trait]
impl PayloadStore for CatalogStore {
    async fn get_agent_type(&self, id: i64) -> Result<AgentType, StoreError> {
        find(&self.catalog.agent_types, "agent type", id, |a| a.id)
    }

    async fn get_agent_type_format(&self, id: i64) -> Result<AgentTypeFormat, StoreError> {
        find(&self.catalog.agent_type_formats, "agent type format", id, |f| f.id)
    }

    async fn get_agent_transport_type(&self, id: i64) -> Result<AgentTransportType, StoreError> {
        find(
            &self.catalog.agent_transport_types,
            "agent transport type",
            id,
            |t| t.id,
        )
    }

    async fn get_transport(&self, id: i64) -> Result<Transport, StoreError> {
        find(&self.catalog.transports, "transport", id, |t| t.id)
    }

    async fn add(&self, mut payload: Payload) -> Result<Payload, StoreError> {
        let mut payloads = self.payloads.lock().await;
        payload.id = payloads.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        debug!("Stored payload {} ({})", payload.id, payload.name);
        payloads.push(payload.clone());
        Ok(payload)
    }

    async fn mark_built(&self, payload_id: i64) -> Result<(), StoreError> {
        let mut payloads = self.payloads.lock().await;
        let payload = payloads
            .iter_mut()
            .find(|p| p.id == payload_id)
            .ok_or(StoreError::NotFound {
                entity: "payload",
                id: payload_id,
            })?;
        payload.built = true;
        Ok(())
    }
}
