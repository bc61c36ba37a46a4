// ABOUTME: Ordered lifecycle checkpoints persisted with every project.
// ABOUTME: The ordinal encodes progress; Running markers precede their Done pair.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A lifecycle checkpoint.
///
/// Variants are declared in lifecycle order and serialized as their ordinal,
/// so comparing two values compares progress. Each layer contributes a
/// `*CleanDone` / `*CleanRunning` / `*DeployRunning` / `*DeployDone` run:
/// a process that dies mid-operation leaves a `*Running` value behind, which
/// the next invocation treats as "redo the operation".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Status {
    #[default]
    InitMissing = 0,
    InitRunning,
    InitDone,
    BakingDone,
    InfraCleanDone,
    InfraCleanRunning,
    InfraDeployRunning,
    InfraDeployDone,
    InfraCheckRunning,
    InfraCheckDone,
    PlatformCleanDone,
    PlatformCleanRunning,
    PlatformDeployRunning,
    PlatformDeployDone,
    PlatformConsulDeployRunning,
    PlatformConsulDeployDone,
    ApplicationCleanDone,
    ApplicationCleanRunning,
    ApplicationDeployRunning,
    ApplicationDeployDone,
}

impl Status {
    pub const ALL: [Status; 20] = [
        Status::InitMissing,
        Status::InitRunning,
        Status::InitDone,
        Status::BakingDone,
        Status::InfraCleanDone,
        Status::InfraCleanRunning,
        Status::InfraDeployRunning,
        Status::InfraDeployDone,
        Status::InfraCheckRunning,
        Status::InfraCheckDone,
        Status::PlatformCleanDone,
        Status::PlatformCleanRunning,
        Status::PlatformDeployRunning,
        Status::PlatformDeployDone,
        Status::PlatformConsulDeployRunning,
        Status::PlatformConsulDeployDone,
        Status::ApplicationCleanDone,
        Status::ApplicationCleanRunning,
        Status::ApplicationDeployRunning,
        Status::ApplicationDeployDone,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Teardown checkpoints, the only values a transition may move back to.
    pub fn is_clean(self) -> bool {
        matches!(
            self,
            Status::InfraCleanDone
                | Status::InfraCleanRunning
                | Status::PlatformCleanDone
                | Status::PlatformCleanRunning
                | Status::ApplicationCleanDone
                | Status::ApplicationCleanRunning
        )
    }

    /// Whether an operation was interrupted at this checkpoint.
    pub fn is_running(self) -> bool {
        matches!(
            self,
            Status::InitRunning
                | Status::InfraCleanRunning
                | Status::InfraDeployRunning
                | Status::InfraCheckRunning
                | Status::PlatformCleanRunning
                | Status::PlatformDeployRunning
                | Status::PlatformConsulDeployRunning
                | Status::ApplicationCleanRunning
                | Status::ApplicationDeployRunning
        )
    }

    /// Short human description used by `status`.
    pub fn describe(self) -> &'static str {
        match self {
            Status::InitMissing => "not initialized",
            Status::InitRunning => "initialization in progress",
            Status::InitDone => "initialized",
            Status::BakingDone => "images baked",
            Status::InfraCleanDone => "infrastructure destroyed",
            Status::InfraCleanRunning => "infrastructure teardown in progress",
            Status::InfraDeployRunning => "infrastructure deploy in progress",
            Status::InfraDeployDone => "infrastructure deployed",
            Status::InfraCheckRunning => "waiting for core services",
            Status::InfraCheckDone => "core services reachable",
            Status::PlatformCleanDone => "platform destroyed",
            Status::PlatformCleanRunning => "platform teardown in progress",
            Status::PlatformDeployRunning => "platform deploy in progress",
            Status::PlatformDeployDone => "platform deployed",
            Status::PlatformConsulDeployRunning => "mesh configuration in progress",
            Status::PlatformConsulDeployDone => "mesh configured",
            Status::ApplicationCleanDone => "application support destroyed",
            Status::ApplicationCleanRunning => "application support teardown in progress",
            Status::ApplicationDeployRunning => "application support deploy in progress",
            Status::ApplicationDeployDone => "fully deployed",
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Status::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| format!("unknown status ordinal {value}"))
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status.ordinal()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
