//! Payload domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::{AgentTransportType, AgentType, AgentTypeFormat, Transport};
use crate::dto::payload::NewPayload;
use crate::secret;

/// Length of the per-payload secret key
pub const PAYLOAD_KEY_LENGTH: usize = 32;

/// Build record for one requested payload
///
/// Created by the builder before any build step runs and persisted through
/// the store, which assigns `id` on insert (zero until then).
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Payload {
    pub id: i64,
    pub agent_type: AgentType,
    pub agent_type_format: AgentTypeFormat,
    pub agent_transport_type: AgentTransportType,
    pub transport: Transport,
    pub name: String,
    pub description: String,
    pub jitter: f64,
    pub beacon_interval: u32,
    pub expiration_date: Option<DateTime<Utc>>,
    pub build_token: String,
    pub key: String,
    pub language_id: i64,
    pub created: DateTime<Utc>,
    pub enabled: bool,
    pub visible: bool,
    pub built: bool,
}

/// Configuration entities a build request resolved to
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub agent_type: AgentType,
    pub agent_type_format: AgentTypeFormat,
    pub agent_transport_type: AgentTransportType,
    pub transport: Transport,
}

impl Payload {
    /// Creates a fresh, unbuilt payload record with a newly generated key
    pub fn new(request: &NewPayload, config: ResolvedConfig, language_id: i64) -> Self {
        Self {
            id: 0,
            agent_type: config.agent_type,
            agent_type_format: config.agent_type_format,
            agent_transport_type: config.agent_transport_type,
            transport: config.transport,
            name: request.name.clone(),
            description: request.description.clone(),
            jitter: request.jitter,
            beacon_interval: request.beacon_interval,
            expiration_date: request.expiration_date,
            build_token: request.build_token.clone(),
            key: secret::generate_secure_string(PAYLOAD_KEY_LENGTH),
            language_id,
            created: Utc::now(),
            enabled: true,
            visible: true,
            built: false,
        }
    }
}

// Key and build token stay out of logs.
impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Payload")
            .field("id", &self.id)
            .field("agent_type", &self.agent_type.name)
            .field("agent_type_format", &self.agent_type_format.name)
            .field("agent_transport_type", &self.agent_transport_type.name)
            .field("transport", &self.transport.name)
            .field("name", &self.name)
            .field("jitter", &self.jitter)
            .field("beacon_interval", &self.beacon_interval)
            .field("expiration_date", &self.expiration_date)
            .field("key", &"<redacted>")
            .field("build_token", &"<redacted>")
            .field("created", &self.created)
            .field("built", &self.built)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> ResolvedConfig {
        ResolvedConfig {
            agent_type: AgentType {
                id: 1,
                name: "Marauder".to_string(),
                guid: String::new(),
                authors: vec![],
            },
            agent_type_format: AgentTypeFormat {
                id: 2,
                agent_type_id: 1,
                name: "exe".to_string(),
                description: String::new(),
                build_command: "make PAYLOADNAME".to_string(),
                build_location: "out/agent.exe".to_string(),
            },
            agent_transport_type: AgentTransportType {
                id: 3,
                agent_type_id: 1,
                name: "HTTP".to_string(),
                transport_type_guid: String::new(),
                build_command: "build.sh --enc ENCKEY".to_string(),
                build_location: "out/transport.dll".to_string(),
            },
            transport: Transport {
                id: 4,
                name: "primary".to_string(),
                transport_type: "HTTP".to_string(),
                guid: String::new(),
                configuration: "[]".to_string(),
            },
        }
    }

    fn request() -> NewPayload {
        NewPayload {
            agent_type_id: 1,
            agent_type_format_id: 2,
            agent_transport_type_id: 3,
            transport_id: 4,
            name: "beacon1".to_string(),
            description: "test payload".to_string(),
            jitter: 10.0,
            beacon_interval: 60,
            expiration_date: None,
            build_token: "tok-123".to_string(),
        }
    }

    #[test]
    fn test_new_payload_defaults() {
        let payload = Payload::new(&request(), resolved(), 7);

        assert_eq!(payload.id, 0);
        assert_eq!(payload.name, "beacon1");
        assert_eq!(payload.language_id, 7);
        assert!(payload.enabled);
        assert!(payload.visible);
        assert!(!payload.built);
        assert_eq!(payload.key.len(), PAYLOAD_KEY_LENGTH);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let payload = Payload::new(&request(), resolved(), 1);
        let rendered = format!("{:?}", payload);

        assert!(!rendered.contains(&payload.key));
        assert!(!rendered.contains("tok-123"));
        assert!(rendered.contains("beacon1"));
    }

    #[test]
    fn test_serializes_full_record() {
        let payload = Payload::new(&request(), resolved(), 1);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["Name"], "beacon1");
        assert_eq!(json["AgentType"]["Name"], "Marauder");
        assert_eq!(json["Key"], payload.key);
        assert_eq!(json["Built"], false);
    }
}
