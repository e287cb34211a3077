//! Shared fixtures for builder tests

use async_trait::async_trait;
use forge_core::domain::agent::{AgentTransportType, AgentType, AgentTypeFormat, Transport};
use forge_core::domain::payload::{Payload, ResolvedConfig};
use forge_core::dto::message::{NewErrorMessage, ReplyRoute};
use forge_core::dto::payload::NewPayload;
use std::path::Path;
use std::sync::Mutex;

use crate::repository::{Catalog, EventBus};
use crate::service::{CommandError, CommandOutput, CommandRunner, ShellCommandRunner};

pub const AGENT_TYPE: &str = "Marauder";
pub const TRANSPORT_OUTPUT: &str = "out/transport.bin";
pub const FORMAT_OUTPUT: &str = "out/agent.exe";

pub fn agent_type() -> AgentType {
    AgentType {
        id: 1,
        name: AGENT_TYPE.to_string(),
        guid: "0f6c5c1e".to_string(),
        authors: vec!["forge".to_string()],
    }
}

pub fn agent_type_format(build_command: &str) -> AgentTypeFormat {
    AgentTypeFormat {
        id: 2,
        agent_type_id: 1,
        name: "exe".to_string(),
        description: "Windows executable".to_string(),
        build_command: build_command.to_string(),
        build_location: FORMAT_OUTPUT.to_string(),
    }
}

pub fn agent_transport_type(build_command: &str) -> AgentTransportType {
    AgentTransportType {
        id: 3,
        agent_type_id: 1,
        name: "HTTP".to_string(),
        transport_type_guid: "a1b2".to_string(),
        build_command: build_command.to_string(),
        build_location: TRANSPORT_OUTPUT.to_string(),
    }
}

pub fn transport() -> Transport {
    Transport {
        id: 4,
        name: "primary".to_string(),
        transport_type: "HTTP".to_string(),
        guid: "c3d4".to_string(),
        configuration: r#"[{"Name":"ENCKEY","Value":"secret"}]"#.to_string(),
    }
}

pub fn catalog(transport_command: &str, format_command: &str) -> Catalog {
    Catalog {
        agent_types: vec![agent_type()],
        agent_type_formats: vec![agent_type_format(format_command)],
        agent_transport_types: vec![agent_transport_type(transport_command)],
        transports: vec![transport()],
    }
}

pub fn request() -> NewPayload {
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

pub fn payload() -> Payload {
    let config = ResolvedConfig {
        agent_type: agent_type(),
        agent_type_format: agent_type_format("make"),
        agent_transport_type: agent_transport_type("build.sh"),
        transport: transport(),
    };
    Payload::new(&request(), config, 1)
}

/// Event bus keeping every published message in memory
#[derive(Default)]
pub struct RecordingBus {
    payloads: Mutex<Vec<(Payload, ReplyRoute)>>,
    errors: Mutex<Vec<NewErrorMessage>>,
}

impl RecordingBus {
    pub fn payloads(&self) -> Vec<(Payload, ReplyRoute)> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<NewErrorMessage> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventBus for RecordingBus {
    async fn publish_payload(&self, payload: &Payload, route: &ReplyRoute) -> anyhow::Result<()> {
        self.payloads
            .lock()
            .unwrap()
            .push((payload.clone(), route.clone()));
        Ok(())
    }

    async fn publish_error(&self, error: &NewErrorMessage) -> anyhow::Result<()> {
        self.errors.lock().unwrap().push(error.clone());
        Ok(())
    }
}

/// `/bin/sh` runner that remembers the command lines it ran
pub struct RecordingRunner {
    inner: ShellCommandRunner,
    commands: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            inner: ShellCommandRunner::new("/bin/sh", None),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn execute(
        &self,
        working_dir: &Path,
        command_line: &str,
    ) -> Result<CommandOutput, CommandError> {
        self.commands.lock().unwrap().push(command_line.to_string());
        self.inner.execute(working_dir, command_line).await
    }
}
