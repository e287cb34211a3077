//! Build stage domain types

use serde::{Deserialize, Serialize};

/// Progress of a single payload build
///
/// Builds advance `Created → TransportBuilding → TransportBuilt → AgentBuilding
/// → AgentBuilt → Publishing → Published`, or stop at the failed state of the
/// stage that broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildStage {
    Created,
    TransportBuilding,
    TransportFailed,
    TransportBuilt,
    AgentBuilding,
    AgentFailed,
    AgentBuilt,
    Publishing,
    PublishFailed,
    Published,
}

impl BuildStage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BuildStage::TransportFailed
                | BuildStage::AgentFailed
                | BuildStage::PublishFailed
                | BuildStage::Published
        )
    }

    /// The next stage on the success path, `None` once terminal
    pub fn next(&self) -> Option<BuildStage> {
        match self {
            BuildStage::Created => Some(BuildStage::TransportBuilding),
            BuildStage::TransportBuilding => Some(BuildStage::TransportBuilt),
            BuildStage::TransportBuilt => Some(BuildStage::AgentBuilding),
            BuildStage::AgentBuilding => Some(BuildStage::AgentBuilt),
            BuildStage::AgentBuilt => Some(BuildStage::Publishing),
            BuildStage::Publishing => Some(BuildStage::Published),
            _ => None,
        }
    }

    /// The failed state reached when this stage breaks
    pub fn failed(&self) -> BuildStage {
        match self {
            BuildStage::Created | BuildStage::TransportBuilding => BuildStage::TransportFailed,
            BuildStage::TransportBuilt | BuildStage::AgentBuilding => BuildStage::AgentFailed,
            BuildStage::AgentBuilt | BuildStage::Publishing => BuildStage::PublishFailed,
            terminal => *terminal,
        }
    }
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuildStage::Created => "Created",
            BuildStage::TransportBuilding => "TransportBuilding",
            BuildStage::TransportFailed => "TransportFailed",
            BuildStage::TransportBuilt => "TransportBuilt",
            BuildStage::AgentBuilding => "AgentBuilding",
            BuildStage::AgentFailed => "AgentFailed",
            BuildStage::AgentBuilt => "AgentBuilt",
            BuildStage::Publishing => "Publishing",
            BuildStage::PublishFailed => "PublishFailed",
            BuildStage::Published => "Published",
        };
        write!(f, "{}", name)
    }
}
