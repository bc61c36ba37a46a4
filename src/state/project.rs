// ABOUTME: Persisted record of one cluster's identity, secrets and lifecycle position.
// ABOUTME: Saved atomically after every status change; layout is re-derived on load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use super::{AwsConfig, AzureConfig, GcpConfig, Layout, Status};
use crate::error::{Error, Result};
use crate::provider::ProviderRegistry;
use crate::types::{Domain, Edition, ProjectName};

pub const DEFAULT_BRANCH: &str = "main";

/// The single source of truth for one cluster deployment.
///
/// Secrets are stored in plaintext inside the state file. The file is created
/// with owner-only permissions, but anyone who can read the workspace can read
/// the root credential of the secrets manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub name: ProjectName,
    pub provider: String,
    pub region: String,
    pub branch: String,
    #[serde(default)]
    pub edition: Edition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_url: Option<String>,

    /// Versioned bucket (or provider equivalent) holding terraform state.
    pub state_store_name: String,

    /// Lock table (or provider equivalent) serializing terraform runs.
    pub lock_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_root_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nomad_token: Option<String>,

    pub status: Status,

    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<GcpConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureConfig>,

    #[serde(skip)]
    layout: Layout,
}

impl ProjectState {
    /// Build a fresh state for a project that has never been persisted.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an invalid name or empty region, and
    /// `Error::UnknownProvider` when no provider is registered under `provider`.
    pub fn create_from_scratch(
        root: &Path,
        name: &str,
        provider: &str,
        region: &str,
    ) -> Result<Self> {
        let name = ProjectName::new(name).map_err(|e| Error::validation(e.to_string()))?;

        let provider = provider.trim().to_ascii_lowercase();
        if !ProviderRegistry::default().contains(&provider) {
            return Err(Error::UnknownProvider(provider));
        }

        let region = region.trim();
        if region.is_empty() {
            return Err(Error::validation("region cannot be empty"));
        }

        let layout = Layout::derive(root, &name, &provider);

        Ok(ProjectState {
            state_store_name: format!("{name}-caravan-terraform-state"),
            lock_name: format!("{name}-caravan-terraform-state-lock"),
            name,
            provider,
            region: region.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            edition: Edition::default(),
            domain: None,
            vault_url: None,
            vault_root_token: None,
            nomad_token: None,
            status: Status::InitMissing,
            updated_at: Utc::now(),
            aws: None,
            gcp: None,
            azure: None,
            layout,
        })
    }

    /// Read the project persisted in `root`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when no state file exists (a normal branch for
    /// callers), `Error::CorruptState` when it cannot be parsed.
    pub fn load_from_storage(root: &Path) -> Result<Self> {
        let path = Layout::state_file_for(root);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(root.to_path_buf()));
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let mut state: ProjectState = serde_json::from_str(&content)
            .map_err(|source| Error::CorruptState { path, source })?;
        state.layout = Layout::derive(root, &state.name, &state.provider);

        tracing::debug!(
            project = %state.name,
            status = %state.status,
            "loaded project state"
        );
        Ok(state)
    }

    /// Whether a project has been persisted in `root`.
    pub fn exists(root: &Path) -> bool {
        Layout::state_file_for(root).is_file()
    }

    /// Write the full state to disk.
    ///
    /// The content goes to a temporary sibling first and is renamed over the
    /// previous file, so a crash mid-write leaves the last valid state intact.
    pub fn save(&self) -> Result<()> {
        let path = &self.layout.state_file;
        let persistence = |source: std::io::Error| Error::Persistence {
            path: path.clone(),
            source,
        };

        let dir = path
            .parent()
            .ok_or_else(|| persistence(std::io::Error::other("state file has no parent")))?;
        std::fs::create_dir_all(dir).map_err(persistence)?;

        let json = serde_json::to_vec_pretty(self).map_err(|e| persistence(e.into()))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(persistence)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(temp.path(), perms).map_err(persistence)?;
        }

        temp.write_all(&json).map_err(persistence)?;
        temp.as_file().sync_all().map_err(persistence)?;
        temp.persist(path).map_err(|e| persistence(e.error))?;

        Ok(())
    }

    /// Move to `next` and persist immediately.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` when `next` would move backwards to
    /// anything other than a clean checkpoint, or a persistence error.
    pub fn advance(&mut self, next: Status) -> Result<()> {
        if next < self.status && !next.is_clean() {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        tracing::info!(
            project = %self.name,
            from = %self.status,
            to = %next,
            "status transition"
        );
        self.status = next;
        self.updated_at = Utc::now();
        self.save()
    }

    /// Validate and set the domain, deriving the secrets-manager URL.
    pub fn set_domain(&mut self, domain: &str) -> Result<()> {
        let domain = Domain::new(domain)
            .map_err(|e| Error::validation(format!("invalid domain '{domain}': {e}")))?;
        self.vault_url = Some(format!("https://{}", domain.host("vault")));
        self.domain = Some(domain);
        Ok(())
    }

    pub fn set_vault_root_token(&mut self, token: String) -> Result<()> {
        self.vault_root_token = Some(token);
        self.save()
    }

    pub fn set_nomad_token(&mut self, token: String) -> Result<()> {
        self.nomad_token = Some(token);
        self.save()
    }

    /// Drop both cached cluster tokens. Persisted by the next `save` or `advance`.
    pub fn clear_cluster_secrets(&mut self) {
        self.vault_root_token = None;
        self.nomad_token = None;
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Domain, or a validation error naming the operation that needs it.
    pub fn require_domain(&self, operation: &str) -> Result<&Domain> {
        self.domain.as_ref().ok_or_else(|| {
            Error::validation(format!("{operation} requires a domain; re-run init with --domain"))
        })
    }

    /// Remove the state file and every checked-out layer repository.
    pub fn remove_from_storage(self) -> Result<()> {
        if self.layout.project_dir.exists() {
            std::fs::remove_dir_all(&self.layout.project_dir)?;
        }
        match std::fs::remove_file(&self.layout.state_file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e)),
        }
        tracing::info!(project = %self.name, "removed local project state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn scratch_state_starts_missing() {
        let dir = tempfile::tempdir().unwrap();
        let state = ProjectState::create_from_scratch(dir.path(), "demo", "aws", "eu-south-1")
            .unwrap();
        assert_eq!(state.status, Status::InitMissing);
        assert_eq!(state.state_store_name, "demo-caravan-terraform-state");
        assert_eq!(state.lock_name, "demo-caravan-terraform-state-lock");
        assert_eq!(state.branch, DEFAULT_BRANCH);
        assert!(state.aws.is_none());
    }

    #[test]
    fn scratch_rejects_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProjectState::create_from_scratch(dir.path(), "demo", "openstack", "r1")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownProvider);
    }

    #[test]
    fn scratch_rejects_bad_name_and_region() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProjectState::create_from_scratch(dir.path(), "Demo!", "aws", "eu-south-1")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = ProjectState::create_from_scratch(dir.path(), "demo", "aws", " ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn advance_rejects_backwards_moves() {
        let dir = tempfile::tempdir().unwrap();
        let mut state =
            ProjectState::create_from_scratch(dir.path(), "demo", "aws", "eu-south-1").unwrap();
        state.advance(Status::InfraDeployDone).unwrap();

        let err = state.advance(Status::InitDone).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(state.status, Status::InfraDeployDone);

        state.advance(Status::InfraCleanRunning).unwrap();
        assert_eq!(state.status, Status::InfraCleanRunning);
    }

    #[test]
    fn set_domain_derives_vault_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut state =
            ProjectState::create_from_scratch(dir.path(), "demo", "aws", "eu-south-1").unwrap();
        state.set_domain("Example.com").unwrap();
        assert_eq!(state.vault_url.as_deref(), Some("https://vault.example.com"));

        let err = state.set_domain("not a domain").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(state.domain.as_ref().unwrap().as_str(), "example.com");
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let state =
            ProjectState::create_from_scratch(dir.path(), "demo", "aws", "eu-south-1").unwrap();
        state.save().unwrap();

        let mode = std::fs::metadata(&state.layout().state_file)
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
