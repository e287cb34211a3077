//! Event-bus message DTOs

use serde::{Deserialize, Serialize};

/// Message type of inbound build requests
pub const NEW_PAYLOAD: &str = "NewPayload";
/// Message type of the "record created" announcement
pub const PAYLOAD: &str = "Payload";
/// Message type of build failure reports
pub const NEW_ERROR_MESSAGE: &str = "NewErrorMessage";

/// Reply routing carried by an inbound message
///
/// Responses to a request are published with the same route; broadcasts use
/// [`ReplyRoute::none`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplyRoute {
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

impl ReplyRoute {
    pub fn new(reply_to: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            reply_to: Some(reply_to.into()),
            correlation_id: Some(correlation_id.into()),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// A typed message together with its routing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope<T> {
    #[serde(rename = "Type")]
    pub message_type: String,
    #[serde(flatten)]
    pub route: ReplyRoute,
    pub body: T,
}

impl<T> Envelope<T> {
    pub fn new(message_type: impl Into<String>, route: ReplyRoute, body: T) -> Self {
        Self {
            message_type: message_type.into(),
            route,
            body,
        }
    }
}

/// Structured build failure report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewErrorMessage {
    pub source: String,
    pub message: String,
    pub details: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = Envelope::new(
            NEW_ERROR_MESSAGE,
            ReplyRoute::none(),
            NewErrorMessage {
                source: "Payload Build Server".to_string(),
                message: "Error building Marauder".to_string(),
                details: "Stdout: \n Stderr: missing tool".to_string(),
            },
        );

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["Type"], "NewErrorMessage");
        assert!(json["ReplyTo"].is_null());
        assert!(json["CorrelationId"].is_null());
        assert_eq!(json["Body"]["Message"], "Error building Marauder");
    }

    #[test]
    fn test_envelope_route_roundtrip() {
        let line = r#"{"Type":"NewPayload","ReplyTo":"api","CorrelationId":"c-1","Body":{"x":1}}"#;
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(line).unwrap();

        assert_eq!(envelope.message_type, NEW_PAYLOAD);
        assert_eq!(envelope.route, ReplyRoute::new("api", "c-1"));
        assert_eq!(envelope.body["x"], 1);
    }

    #[test]
    fn test_envelope_without_route() {
        let line = r#"{"Type":"NewPayload","Body":null}"#;
        let envelope: Envelope<Option<u8>> = serde_json::from_str(line).unwrap();
        assert_eq!(envelope.route, ReplyRoute::none());
    }
}
