// ABOUTME: The three ordered deployable layers of a cluster.
// ABOUTME: Maps each layer to its deploy and clean checkpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Status;

/// A deployable layer. Each layer depends on the previous one having reached
/// its `*DeployDone` checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeployLayer {
    Infrastructure,
    Platform,
    ApplicationSupport,
}

impl DeployLayer {
    /// Layers in deploy order.
    pub const ORDERED: [DeployLayer; 3] = [
        DeployLayer::Infrastructure,
        DeployLayer::Platform,
        DeployLayer::ApplicationSupport,
    ];

    pub fn deploy_running(self) -> Status {
        match self {
            DeployLayer::Infrastructure => Status::InfraDeployRunning,
            DeployLayer::Platform => Status::PlatformDeployRunning,
            DeployLayer::ApplicationSupport => Status::ApplicationDeployRunning,
        }
    }

    pub fn deploy_done(self) -> Status {
        match self {
            DeployLayer::Infrastructure => Status::InfraDeployDone,
            DeployLayer::Platform => Status::PlatformDeployDone,
            DeployLayer::ApplicationSupport => Status::ApplicationDeployDone,
        }
    }

    pub fn clean_running(self) -> Status {
        match self {
            DeployLayer::Infrastructure => Status::InfraCleanRunning,
            DeployLayer::Platform => Status::PlatformCleanRunning,
            DeployLayer::ApplicationSupport => Status::ApplicationCleanRunning,
        }
    }

    pub fn clean_done(self) -> Status {
        match self {
            DeployLayer::Infrastructure => Status::InfraCleanDone,
            DeployLayer::Platform => Status::PlatformCleanDone,
            DeployLayer::ApplicationSupport => Status::ApplicationCleanDone,
        }
    }

    /// Checkpoint the project must have reached before this layer can deploy.
    pub fn prerequisite(self) -> Status {
        match self {
            DeployLayer::Infrastructure => Status::InitDone,
            DeployLayer::Platform => Status::InfraDeployDone,
            DeployLayer::ApplicationSupport => Status::PlatformDeployDone,
        }
    }

    /// Whether applying this layer needs the cluster's secrets in its environment.
    pub fn needs_secrets(self) -> bool {
        !matches!(self, DeployLayer::Infrastructure)
    }

    /// Stable short name used in directory names and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            DeployLayer::Infrastructure => "infrastructure",
            DeployLayer::Platform => "platform",
            DeployLayer::ApplicationSupport => "application-support",
        }
    }
}

impl fmt::Display for DeployLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
