//! Event bus
//!
//! Publishes the builder's outbound messages. Delivery guarantees belong to
//! the bus implementation; callers treat publication as best effort.

use anyhow::{Context, Result};
use async_trait::async_trait;
use forge_core::domain::payload::Payload;
use forge_core::dto::message::{self, Envelope, NewErrorMessage, ReplyRoute};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Repository trait for outbound event publication
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Announces a newly recorded payload to the requester
    ///
    /// # Arguments
    /// * `payload` - The full resolved record
    /// * `route` - Reply routing copied from the inbound request
    async fn publish_payload(&self, payload: &Payload, route: &ReplyRoute) -> Result<()>;

    /// Broadcasts a build failure report with no reply routing
    async fn publish_error(&self, error: &NewErrorMessage) -> Result<()>;
}

/// Event bus writing one JSON envelope per line
///
/// The binary points this at stdout; tests use an in-memory buffer.
pub struct JsonLinesEventBus<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesEventBus<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    async fn write_envelope<T: Serialize + Sync>(&self, envelope: &Envelope<T>) -> Result<()> {
        let mut line =
            serde_json::to_vec(envelope).context("Failed to serialize event envelope")?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .context("Failed to write event")?;
        writer.flush().await.context("Failed to flush event")?;
        Ok(())
    }

    /// Consumes the bus and returns the underlying writer
    #[allow(dead_code)]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> EventBus for JsonLinesEventBus<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn publish_payload(&self, payload: &Payload, route: &ReplyRoute) -> Result<()> {
        self.write_envelope(&Envelope::new(message::PAYLOAD, route.clone(), payload))
            .await
    }

    async fn publish_error(&self, error: &NewErrorMessage) -> Result<()> {
        self.write_envelope(&Envelope::new(
            message::NEW_ERROR_MESSAGE,
            ReplyRoute::none(),
            error,
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn lines(buffer: Vec<u8>) -> Vec<serde_json::Value> {
        String::from_utf8(buffer)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_publish_payload_keeps_route() {
        let bus = JsonLinesEventBus::new(Vec::new());
        let payload = test_support::payload();

        bus.publish_payload(&payload, &ReplyRoute::new("api-replies", "corr-1"))
            .await
            .unwrap();

        let events = lines(bus.into_inner());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["Type"], "Payload");
        assert_eq!(events[0]["ReplyTo"], "api-replies");
        assert_eq!(events[0]["CorrelationId"], "corr-1");
        assert_eq!(events[0]["Body"]["Name"], "beacon1");
    }

    #[tokio::test]
    async fn test_publish_error_has_no_route() {
        let bus = JsonLinesEventBus::new(Vec::new());

        bus.publish_error(&NewErrorMessage {
            source: "Payload Build Server".to_string(),
            message: "Error building Marauder".to_string(),
            details: "boom".to_string(),
        })
        .await
        .unwrap();

        let events = lines(bus.into_inner());
        assert_eq!(events[0]["Type"], "NewErrorMessage");
        assert!(events[0]["ReplyTo"].is_null());
        assert!(events[0]["CorrelationId"].is_null());
        assert_eq!(events[0]["Body"]["Details"], "boom");
    }
}
