// ABOUTME: Working-directory layout derived from a project's name and provider.
// ABOUTME: Recomputed on every load so it never depends on a previous run.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::DeployLayer;
use crate::types::ProjectName;

/// Directory holding the state file, lock file and project checkouts.
pub const STATE_DIR: &str = ".caravan";
pub const STATE_FILE: &str = "caravan.state";
pub const LOCK_FILE: &str = "caravan.lock";

pub const BAKING_REPOSITORY: &str = "caravan-baking";
pub const PLATFORM_REPOSITORY: &str = "caravan-platform";
pub const APPLICATION_REPOSITORY: &str = "caravan-application-support";

/// Paths of one terraform-driven layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerPaths {
    /// Repository checked out for this layer.
    pub repository: String,
    /// Checkout destination.
    pub checkout: PathBuf,
    /// Terraform working directory.
    pub dir: PathBuf,
    pub var_file: PathBuf,
    /// Remote state backend definition. Baking keeps its state locally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub root: PathBuf,
    pub state_dir: PathBuf,
    pub state_file: PathBuf,
    pub lock_file: PathBuf,
    pub project_dir: PathBuf,
    pub baking: LayerPaths,
    pub infrastructure: LayerPaths,
    pub platform: LayerPaths,
    pub application_support: LayerPaths,
    /// CA bundle written by the infrastructure layer, used to verify the services.
    pub ca_bundle: PathBuf,
    /// Root token of the secrets manager written by the infrastructure layer.
    pub root_token_file: PathBuf,
    /// Service-account key material for providers that need one.
    pub service_account_key: PathBuf,
}

impl Layout {
    pub fn derive(root: &Path, name: &ProjectName, provider: &str) -> Self {
        let state_dir = root.join(STATE_DIR);
        let project_dir = state_dir.join(name.as_str());

        let baking_checkout = project_dir.join(BAKING_REPOSITORY);
        let baking_dir = baking_checkout.join("terraform");
        let baking = LayerPaths {
            repository: BAKING_REPOSITORY.to_string(),
            var_file: baking_dir.join(format!("{provider}-baking.tfvars")),
            dir: baking_dir,
            checkout: baking_checkout,
            backend_file: None,
        };

        let infrastructure =
            Self::layer_paths(&project_dir, format!("caravan-infra-{provider}"), provider);
        let platform = Self::layer_paths(&project_dir, PLATFORM_REPOSITORY.to_string(), provider);
        let application_support =
            Self::layer_paths(&project_dir, APPLICATION_REPOSITORY.to_string(), provider);

        Layout {
            root: root.to_path_buf(),
            state_file: state_dir.join(STATE_FILE),
            lock_file: state_dir.join(LOCK_FILE),
            ca_bundle: infrastructure.dir.join("ca_certs.pem"),
            root_token_file: infrastructure.dir.join(format!(".{name}-root_token")),
            service_account_key: infrastructure
                .dir
                .join(format!(".{name}-terraform-sa-key.json")),
            state_dir,
            project_dir,
            baking,
            infrastructure,
            platform,
            application_support,
        }
    }

    fn layer_paths(project_dir: &Path, repository: String, provider: &str) -> LayerPaths {
        let checkout = project_dir.join(&repository);
        LayerPaths {
            var_file: checkout.join(format!("{provider}.tfvars")),
            backend_file: Some(checkout.join("backend.tf")),
            dir: checkout.clone(),
            checkout,
            repository,
        }
    }

    /// Location of the state file for a workspace, before any project is known.
    pub fn state_file_for(root: &Path) -> PathBuf {
        root.join(STATE_DIR).join(STATE_FILE)
    }

    /// Location of the lock file for a workspace.
    pub fn lock_file_for(root: &Path) -> PathBuf {
        root.join(STATE_DIR).join(LOCK_FILE)
    }

    pub fn layer(&self, layer: DeployLayer) -> &LayerPaths {
        match layer {
            DeployLayer::Infrastructure => &self.infrastructure,
            DeployLayer::Platform => &self.platform,
            DeployLayer::ApplicationSupport => &self.application_support,
        }
    }

    /// Every repository checkout, baking first.
    pub fn checkouts(&self) -> [&LayerPaths; 4] {
        [
            &self.baking,
            &self.infrastructure,
            &self.platform,
            &self.application_support,
        ]
    }
}
