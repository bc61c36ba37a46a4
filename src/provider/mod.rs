// ABOUTME: The provider contract and the registry that constructs providers by tag.
// ABOUTME: The registry is the only place that branches on the provider name.

mod aws;
mod azure;
mod cli;
mod gcp;

pub use aws::AwsProvider;
pub use azure::AzureProvider;
pub use gcp::GcpProvider;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::lifecycle::{LifecycleDriver, StatusReport};
use crate::process::CommandRunner;
use crate::state::{DeployLayer, ProjectState};
use crate::template::Template;

/// What every cloud backend must provide.
///
/// Implementations hold a [`LifecycleDriver`] and delegate the terraform
/// lifecycle to it, adding their own credentials to the environment.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry tag, e.g. `aws`.
    fn tag(&self) -> &'static str;

    /// Store provider-specific settings in the project's provider block.
    fn configure(&self, state: &mut ProjectState, options: &ProviderOptions) -> Result<()>;

    /// One entry per generated configuration file.
    fn templates(&self, state: &ProjectState) -> Vec<Template>;

    /// Provider-specific constraints, checked before any resource is touched.
    fn validate_configuration(&self, state: &ProjectState) -> Result<()>;

    /// Credentials selector passed to every terraform run.
    fn environment(&self, state: &ProjectState) -> BTreeMap<String, String>;

    fn driver(&self) -> &LifecycleDriver;

    /// Create the remote state store, the lock and any identity bootstrap.
    async fn init_provider(&self, state: &ProjectState) -> Result<()>;

    async fn bake(&self, state: &mut ProjectState) -> Result<()>;

    async fn deploy(&self, state: &mut ProjectState, layer: DeployLayer) -> Result<()>;

    async fn destroy(
        &self,
        state: &mut ProjectState,
        layer: DeployLayer,
        force: bool,
        diag: &mut Diagnostics,
    ) -> Result<()>;

    /// Remove what `init_provider` created.
    async fn clean_provider(&self, state: &ProjectState) -> Result<()>;

    async fn status(&self, state: &ProjectState) -> StatusReport;
}

/// Provider-specific init flags. Each provider reads only its own fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderOptions {
    pub aws_profile: Option<String>,
    pub gcp_parent_project: Option<String>,
    pub gcp_organization_id: Option<String>,
    pub gcp_billing_account: Option<String>,
    pub azure_resource_group: Option<String>,
    pub azure_subscription_id: Option<String>,
    pub azure_tenant_id: Option<String>,
}

/// Shared collaborators handed to every provider factory.
#[derive(Clone)]
pub struct ProviderTools {
    pub driver: LifecycleDriver,
    pub runner: Arc<dyn CommandRunner>,
    /// Bound on each cloud CLI call.
    pub command_timeout: Duration,
}

impl std::fmt::Debug for ProviderTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTools")
            .field("driver", &self.driver)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

pub type ProviderFactory = fn(ProviderTools) -> Box<dyn Provider>;

/// Maps provider tags to factories.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    factories: BTreeMap<&'static str, ProviderFactory>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(aws::TAG, aws::factory);
        registry.register(gcp::TAG, gcp::factory);
        registry.register(azure::TAG, azure::factory);
        registry
    }
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, tag: &'static str, factory: ProviderFactory) {
        self.factories.insert(tag, factory);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Construct the provider registered under `tag`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownProvider` when nothing is registered under `tag`.
    pub fn build(&self, tag: &str, tools: ProviderTools) -> Result<Box<dyn Provider>> {
        let factory = self
            .factories
            .get(tag)
            .ok_or_else(|| Error::UnknownProvider(tag.to_string()))?;
        Ok(factory(tools))
    }
}

/// Rules every provider applies before its own.
pub(crate) fn validate_common(state: &ProjectState) -> Result<()> {
    if state.region.trim().is_empty() {
        return Err(Error::validation("region cannot be empty"));
    }
    state.require_domain("init")?;
    Ok(())
}

/// Missing-value error for a required provider setting.
pub(crate) fn required(value: &str, flag: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{flag} is required")));
    }
    Ok(())
}
