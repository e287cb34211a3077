//! Request consumer
//!
//! Reads `NewPayload` envelopes, one JSON document per line, and runs each
//! build in its own task. Builds for different requests proceed in parallel
//! up to the configured limit.

use anyhow::{Context, Result};
use forge_core::dto::message::{self, Envelope, ReplyRoute};
use forge_core::dto::payload::NewPayload;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::service::BuildService;

/// Consumes build requests until the input stream ends
pub struct RequestConsumer {
    service: Arc<BuildService>,
    semaphore: Arc<Semaphore>,
}

impl RequestConsumer {
    /// Creates a new request consumer
    ///
    /// # Arguments
    /// * `service` - Build service shared by all request tasks
    /// * `max_parallel_builds` - Max builds running at the same time
    pub fn new(service: Arc<BuildService>, max_parallel_builds: usize) -> Self {
        Self {
            service,
            semaphore: Arc::new(Semaphore::new(max_parallel_builds)),
        }
    }

    /// Reads requests until EOF, then waits for in-flight builds
    ///
    /// # Returns
    /// Number of builds that were started
    pub async fn run<R>(&self, reader: R) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        info!("Waiting for payload build requests");

        let mut lines = reader.lines();
        let mut builds = JoinSet::new();
        let mut started = 0;

        while let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read request stream")?
        {
            reap_finished(&mut builds);

            let Some((request, route)) = Self::decode(&line) else {
                continue;
            };

            // Wait for a free slot; requests queue up behind running builds
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .context("Build semaphore closed")?;
            self.spawn_build(&mut builds, request, route, permit);
            started += 1;
        }

        debug!(
            "Request stream closed, waiting for {} build(s)",
            builds.len()
        );

        while let Some(result) = builds.join_next().await {
            if let Err(e) = result {
                warn!("Build task panicked: {}", e);
            }
        }

        info!("Processed {} payload request(s)", started);
        Ok(started)
    }

    /// Parses one line, skipping anything that is not a build request
    fn decode(line: &str) -> Option<(NewPayload, ReplyRoute)> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let envelope: Envelope<serde_json::Value> = match serde_json::from_str(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Discarding malformed message: {}", e);
                return None;
            }
        };

        if envelope.message_type != message::NEW_PAYLOAD {
            debug!("Ignoring message of type {}", envelope.message_type);
            return None;
        }

        match serde_json::from_value::<NewPayload>(envelope.body) {
            Ok(request) => Some((request, envelope.route)),
            Err(e) => {
                warn!("Discarding undecodable NewPayload message: {}", e);
                None
            }
        }
    }

    /// Spawns a task running a single build
    fn spawn_build(
        &self,
        builds: &mut JoinSet<()>,
        request: NewPayload,
        route: ReplyRoute,
        permit: OwnedSemaphorePermit,
    ) {
        let service = Arc::clone(&self.service);

        builds.spawn(async move {
            // Failures were already reported by the service
            let _ = service.run_build(&request, &route).await;
            drop(permit);
        });
    }
}

/// Drops the results of builds that already finished
///
/// # Returns
/// Number of tasks reaped
fn reap_finished(builds: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(result) = builds.try_join_next() {
        if let Err(e) = result {
            warn!("Build task panicked: {}", e);
        }
        reaped += 1;
    }
    reaped
}
