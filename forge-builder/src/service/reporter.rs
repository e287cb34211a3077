//! Error reporting service

use forge_core::dto::message::NewErrorMessage;
use std::sync::Arc;
use tracing::{error, warn};

use crate::repository::EventBus;

/// Emits build failure reports on the event bus
#[derive(Clone)]
pub struct ErrorReporter {
    source: String,
    bus: Arc<dyn EventBus>,
}

impl ErrorReporter {
    /// # Arguments
    /// * `source` - `Source` label stamped on every report
    /// * `bus` - Event bus the reports are broadcast on
    pub fn new(source: impl Into<String>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            source: source.into(),
            bus,
        }
    }

    /// Publishes a failure report, best effort
    ///
    /// Delivery problems are logged and swallowed. The report is returned so
    /// the caller can surface it.
    pub async fn report(
        &self,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> NewErrorMessage {
        let report = NewErrorMessage {
            source: self.source.clone(),
            message: message.into(),
            details: details.into(),
        };

        error!("{}: {}", report.message, report.details);

        if let Err(e) = self.bus.publish_error(&report).await {
            warn!("Failed to publish error report: {:#}", e);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::JsonLinesEventBus;
    use async_trait::async_trait;
    use forge_core::domain::payload::Payload;
    use forge_core::dto::message::ReplyRoute;

    struct BrokenBus;

    #[async_trait]
    impl EventBus for BrokenBus {
        async fn publish_payload(&self, _: &Payload, _: &ReplyRoute) -> anyhow::Result<()> {
            anyhow::bail!("bus down")
        }

        async fn publish_error(&self, _: &NewErrorMessage) -> anyhow::Result<()> {
            anyhow::bail!("bus down")
        }
    }

    #[tokio::test]
    async fn test_report_stamps_source() {
        let bus = Arc::new(JsonLinesEventBus::new(Vec::new()));
        let reporter = ErrorReporter::new("Payload Build Server", bus.clone());

        let report = reporter
            .report("Error building Marauder", "Stdout: \n Stderr: missing tool")
            .await;

        assert_eq!(report.source, "Payload Build Server");
        assert_eq!(report.message, "Error building Marauder");
    }

    #[tokio::test]
    async fn test_report_survives_delivery_failure() {
        let reporter = ErrorReporter::new("Payload Build Server", Arc::new(BrokenBus));

        let report = reporter.report("Error building Marauder", "details").await;
        assert_eq!(report.details, "details");
    }
}
