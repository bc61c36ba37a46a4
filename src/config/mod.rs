// ABOUTME: Settings for caravan runs, read from an optional caravan.yml.
// ABOUTME: Built once at the command boundary and passed down explicitly.

mod probe;
mod timeouts;

pub use probe::ProbeConfig;
pub use timeouts::TimeoutsConfig;

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "caravan.yml";
pub const CONFIG_FILENAME_ALT: &str = "caravan.yaml";
pub const CONFIG_FILENAME_HIDDEN: &str = ".caravan.yml";

pub const DEFAULT_ORGANIZATION: &str = "bitrockteam";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub repositories: RepositoryConfig,

    #[serde(default)]
    pub terraform: TerraformConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryConfig {
    /// Organization hosting the layer repositories.
    #[serde(default = "default_organization")]
    pub organization: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            organization: default_organization(),
        }
    }
}

fn default_organization() -> String {
    DEFAULT_ORGANIZATION.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TerraformConfig {
    #[serde(default = "default_terraform_binary")]
    pub binary: String,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            binary: default_terraform_binary(),
        }
    }
}

fn default_terraform_binary() -> String {
    crate::terraform::DEFAULT_BINARY.to_string()
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file deserializes as null.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the first settings file found in `dir`, or defaults if there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_HIDDEN),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Loading settings from {}", path.display());
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }
}
