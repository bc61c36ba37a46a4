// ABOUTME: Snapshot of a project printed by the status command.

use crate::probe::Endpoints;
use crate::state::Status;
use crate::types::Edition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub name: String,
    pub provider: String,
    pub region: String,
    pub edition: Edition,
    pub status: Status,
    /// Known once a domain is set.
    pub endpoints: Option<Endpoints>,
    /// Queried only once infrastructure is deployed.
    pub versions: Option<ServiceVersions>,
}

/// Reported versions, possibly sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceVersions {
    pub vault: String,
    pub consul: String,
    pub nomad: String,
}

impl ServiceVersions {
    /// Services whose version could not be read, by name.
    pub fn unavailable(&self) -> Vec<&'static str> {
        [
            ("vault", &self.vault),
            ("consul", &self.consul),
            ("nomad", &self.nomad),
        ]
        .into_iter()
        .filter(|(_, v)| {
            v.as_str() == crate::probe::VERSION_ERROR || v.as_str() == crate::probe::VERSION_NOT_FOUND
        })
        .map(|(name, _)| name)
        .collect()
    }
}
