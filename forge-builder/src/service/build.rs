//! Build service
//!
//! Drives one payload build from request to uploaded artifact:
//! - Resolving the referenced agent configuration
//! - Recording the payload and announcing it to the requester
//! - Building the transport module, then the agent embedding it
//! - Publishing the finished artifact
//!
//! Any failure ends the build with exactly one error report. Nothing is
//! retried.

use forge_core::domain::agent::TransportConfigEntry;
use forge_core::domain::build::BuildStage;
use forge_core::domain::payload::{Payload, ResolvedConfig};
use forge_core::dto::message::{NewErrorMessage, ReplyRoute};
use forge_core::dto::payload::NewPayload;
use forge_core::secret;
use forge_core::template::{self, FormatValues};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::BuildError;
use crate::repository::{EventBus, PayloadStore};
use crate::service::command::CommandRunner;
use crate::service::locks::WorkdirLocks;
use crate::service::publisher::{ArtifactPublisher, PublishedArtifact};
use crate::service::reporter::ErrorReporter;

/// Tracks and logs a build's progress through its stages
struct StageTracker {
    payload_id: i64,
    stage: BuildStage,
}

impl StageTracker {
    fn new(payload_id: i64) -> Self {
        Self {
            payload_id,
            stage: BuildStage::Created,
        }
    }

    fn advance(&mut self) -> BuildStage {
        if let Some(next) = self.stage.next() {
            debug!("Payload {}: {} -> {}", self.payload_id, self.stage, next);
            self.stage = next;
        }
        self.stage
    }

    fn fail(&mut self) {
        let failed = self.stage.failed();
        info!("Payload {}: {} -> {}", self.payload_id, self.stage, failed);
        self.stage = failed;
    }
}

/// Orchestrates payload builds
pub struct BuildService {
    store: Arc<dyn PayloadStore>,
    bus: Arc<dyn EventBus>,
    runner: Arc<dyn CommandRunner>,
    publisher: Arc<dyn ArtifactPublisher>,
    reporter: ErrorReporter,
    locks: WorkdirLocks,
    agents_path: PathBuf,
    language_id: i64,
}

impl BuildService {
    /// Creates a new build service
    ///
    /// # Arguments
    /// * `config` - Builder configuration (agents path, language id, error source)
    /// * `store` - Persistent store for configuration lookups and payload records
    /// * `bus` - Event bus for notifications and error reports
    /// * `runner` - Executes rendered build commands
    /// * `publisher` - Relocates and uploads finished artifacts
    pub fn new(
        config: &Config,
        store: Arc<dyn PayloadStore>,
        bus: Arc<dyn EventBus>,
        runner: Arc<dyn CommandRunner>,
        publisher: Arc<dyn ArtifactPublisher>,
    ) -> Self {
        Self {
            store,
            reporter: ErrorReporter::new(config.error_source.clone(), bus.clone()),
            bus,
            runner,
            publisher,
            locks: WorkdirLocks::new(),
            agents_path: config.agents_path.clone(),
            language_id: config.language_id,
        }
    }

    /// Runs a complete build for one request
    ///
    /// # Arguments
    /// * `request` - The build request
    /// * `route` - Reply routing of the request, used for the "record created" event
    ///
    /// # Returns
    /// The published artifact, or the error report that was emitted
    pub async fn run_build(
        &self,
        request: &NewPayload,
        route: &ReplyRoute,
    ) -> Result<PublishedArtifact, NewErrorMessage> {
        info!("Got new payload request '{}'", request.name);

        let (config, entries) = match self.resolve(request).await {
            Ok(resolved) => resolved,
            Err(e) => {
                if e.is_config_error() {
                    warn!("Rejecting payload request '{}'", request.name);
                }
                return Err(self.report(&e, "").await);
            }
        };

        let payload = match self
            .store
            .add(Payload::new(request, config, self.language_id))
            .await
        {
            Ok(payload) => payload,
            Err(e) => return Err(self.report(&BuildError::Store(e), "").await),
        };
        info!(
            "Recorded payload {} ({} / {})",
            payload.id, payload.agent_type.name, payload.agent_type_format.name
        );

        if let Err(e) = self.bus.publish_payload(&payload, route).await {
            warn!("Failed to announce payload {}: {:#}", payload.id, e);
        }

        match self.build_and_publish(&payload, &entries).await {
            Ok(published) => {
                if let Err(e) = self.store.mark_built(payload.id).await {
                    warn!("Failed to mark payload {} as built: {}", payload.id, e);
                }
                info!(
                    "Build successful: payload {} published as {}",
                    payload.id,
                    published.path.display()
                );
                Ok(published)
            }
            Err(e) => Err(self.report_build(&e, &payload).await),
        }
    }

    async fn report(&self, err: &BuildError, agent_type: &str) -> NewErrorMessage {
        self.reporter
            .report(err.report_message(agent_type), err.report_details())
            .await
    }

    /// Reports a failure of a recorded build; captured output may echo the key
    async fn report_build(&self, err: &BuildError, payload: &Payload) -> NewErrorMessage {
        self.reporter
            .report(
                err.report_message(&payload.agent_type.name),
                secret::redact(&err.report_details(), &payload.key),
            )
            .await
    }

    /// Validates the request and looks up everything it references
    async fn resolve(
        &self,
        request: &NewPayload,
    ) -> Result<(ResolvedConfig, Vec<TransportConfigEntry>), BuildError> {
        request.validate()?;

        let config = ResolvedConfig {
            agent_type: self
                .store
                .get_agent_type(request.agent_type_id)
                .await
                .map_err(BuildError::from_lookup)?,
            agent_type_format: self
                .store
                .get_agent_type_format(request.agent_type_format_id)
                .await
                .map_err(BuildError::from_lookup)?,
            agent_transport_type: self
                .store
                .get_agent_transport_type(request.agent_transport_type_id)
                .await
                .map_err(BuildError::from_lookup)?,
            transport: self
                .store
                .get_transport(request.transport_id)
                .await
                .map_err(BuildError::from_lookup)?,
        };

        let entries =
            config
                .transport
                .config_entries()
                .map_err(|source| BuildError::InvalidConfig {
                    transport: config.transport.name.clone(),
                    source,
                })?;

        Ok((config, entries))
    }

    /// Runs both build stages and publication under the working directory lock
    async fn build_and_publish(
        &self,
        payload: &Payload,
        entries: &[TransportConfigEntry],
    ) -> Result<PublishedArtifact, BuildError> {
        let working_dir = self.agents_path.join(&payload.agent_type.name);
        let _guard = self.locks.acquire(&working_dir).await;

        let mut tracker = StageTracker::new(payload.id);
        let result = self
            .run_stages(&working_dir, payload, entries, &mut tracker)
            .await;

        if result.is_err() {
            tracker.fail();
        }
        result
    }

    async fn run_stages(
        &self,
        working_dir: &Path,
        payload: &Payload,
        entries: &[TransportConfigEntry],
        tracker: &mut StageTracker,
    ) -> Result<PublishedArtifact, BuildError> {
        let stage = tracker.advance();
        let transport_command =
            template::render_transport(&payload.agent_transport_type.build_command, entries);
        let transport_path = self
            .run_stage(
                stage,
                working_dir,
                &payload.agent_transport_type.build_location,
                &transport_command,
                &payload.key,
            )
            .await?;
        let transport = self.encode_output(stage, &transport_path).await?;
        tracker.advance();

        let stage = tracker.advance();
        let values = FormatValues {
            payload_name: payload.name.clone(),
            payload_key: payload.key.clone(),
            transport,
            beacon_interval: payload.beacon_interval,
            jitter: payload.jitter,
            expiration: payload.expiration_date,
        };
        let agent_command =
            template::render_format(&payload.agent_type_format.build_command, &values);
        let agent_path = self
            .run_stage(
                stage,
                working_dir,
                &payload.agent_type_format.build_location,
                &agent_command,
                &payload.key,
            )
            .await?;
        tracker.advance();

        tracker.advance();
        let published = self.publisher.publish(&agent_path, payload).await?;
        tracker.advance();

        Ok(published)
    }

    /// Clears the stale output, runs the command and checks its exit code
    ///
    /// # Returns
    /// Path of the stage's declared output file
    async fn run_stage(
        &self,
        stage: BuildStage,
        working_dir: &Path,
        build_location: &str,
        command: &str,
        key: &str,
    ) -> Result<PathBuf, BuildError> {
        let output_path = working_dir.join(build_location);

        match tokio::fs::remove_file(&output_path).await {
            Ok(()) => debug!("Removed stale output {}", output_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(BuildError::OutputIo {
                    stage,
                    action: "remove",
                    path: output_path.display().to_string(),
                    source,
                });
            }
        }

        info!(
            "{}: executing in {}: {}",
            stage,
            working_dir.display(),
            secret::redact(command, key)
        );
        let output = self
            .runner
            .execute(working_dir, command)
            .await
            .map_err(|source| BuildError::CommandFailed { stage, source })?;

        if !output.success() {
            return Err(BuildError::BuildFailure { stage, output });
        }

        Ok(output_path)
    }

    /// Reads a stage's output file as base64
    async fn encode_output(&self, stage: BuildStage, path: &Path) -> Result<String, BuildError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| BuildError::OutputIo {
                stage,
                action: "read",
                path: path.display().to_string(),
                source,
            })?;

        if bytes.is_empty() {
            return Err(BuildError::OutputEmpty {
                stage,
                path: path.display().to_string(),
            });
        }

        Ok(template::encode(&bytes))
    }
}
