// ABOUTME: Public endpoints of the secrets manager, mesh and scheduler.
// ABOUTME: Derived from the project domain; overridable for tests and private setups.

use crate::types::Domain;

/// A named URL to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub name: String,
    pub url: String,
}

impl ProbeTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Base URLs of the three cluster services, without trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub vault: String,
    pub consul: String,
    pub nomad: String,
}

impl Endpoints {
    pub fn for_domain(domain: &Domain) -> Self {
        Self {
            vault: format!("https://{}", domain.host("vault")),
            consul: format!("https://{}", domain.host("consul")),
            nomad: format!("https://{}", domain.host("nomad")),
        }
    }

    /// All services reachable through one base URL, e.g. a local mock.
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            vault: base.to_string(),
            consul: base.to_string(),
            nomad: base.to_string(),
        }
    }

    pub fn vault_health(&self) -> ProbeTarget {
        ProbeTarget::new("vault", format!("{}/v1/sys/health", self.vault))
    }

    pub fn consul_leader(&self) -> ProbeTarget {
        ProbeTarget::new("consul", format!("{}/v1/status/leader", self.consul))
    }

    pub fn nomad_leader(&self) -> ProbeTarget {
        ProbeTarget::new("nomad", format!("{}/v1/status/leader", self.nomad))
    }

    pub fn connect_ca_roots(&self) -> ProbeTarget {
        ProbeTarget::new(
            "consul connect CA",
            format!("{}/v1/connect/ca/roots", self.consul),
        )
    }

    /// Gates checked once the infrastructure layer is up.
    pub fn infrastructure_gates(&self) -> [ProbeTarget; 3] {
        [self.vault_health(), self.consul_leader(), self.nomad_leader()]
    }

    /// Dynamic-credential path issuing a scheduler management token.
    pub fn nomad_bootstrap_creds(&self) -> String {
        format!("{}/v1/nomad/creds/bootstrap", self.vault)
    }

    pub fn nomad_agent_self(&self) -> String {
        format!("{}/v1/agent/self", self.nomad)
    }

    pub fn consul_ui(&self) -> String {
        format!("{}/ui/", self.consul)
    }
}
