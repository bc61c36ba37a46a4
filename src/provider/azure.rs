// ABOUTME: Microsoft Azure provider: storage account container as the state store.
// ABOUTME: Blob leases provide terraform's lock, so no separate lock resource is created.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{Provider, ProviderOptions, ProviderTools, cli, required, validate_common};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::lifecycle::{LifecycleDriver, StatusReport};
use crate::process::CommandSpec;
use crate::state::{AzureConfig, DeployLayer, ProjectState};
use crate::template::{self, Template};
use crate::types::ProjectName;

pub const TAG: &str = "azure";

pub const STATE_CONTAINER: &str = "tfstate";

const STORAGE_ACCOUNT_SUFFIX: &str = "tfstate";
const STORAGE_ACCOUNT_MIN: usize = 3;
const STORAGE_ACCOUNT_MAX: usize = 24;

const BAKING_VARS: &str = r#"build_on_azure        = true
build_image_name      = "caravan-os"
azure_resource_group  = "{{ azure.resource_group }}"
azure_subscription_id = "{{ azure.subscription_id }}"
azure_tenant_id       = "{{ azure.tenant_id }}"
azure_location        = "{{ region }}"
edition               = "{{ edition }}"
"#;

const INFRASTRUCTURE_VARS: &str = r#"prefix              = "{{ name }}"
location            = "{{ region }}"
resource_group_name = "{{ azure.resource_group }}"
subscription_id     = "{{ azure.subscription_id }}"
tenant_id           = "{{ azure.tenant_id }}"
external_domain     = "{{ domain }}"
use_le_staging      = true
ca_certs_file       = "{{ paths.ca_bundle }}"
root_token_file     = "{{ paths.root_token_file }}"
"#;

const PLATFORM_EXTRA_VARS: &str = r#"azure_subscription_id = "{{ azure.subscription_id }}"
azure_tenant_id       = "{{ azure.tenant_id }}"
"#;

const BACKEND: &str = r#"terraform {
  backend "azurerm" {
    resource_group_name  = "{{ azure.resource_group }}"
    storage_account_name = "{{ azure.storage_account }}"
    container_name       = "tfstate"
    key                  = "{{ layer }}.terraform.tfstate"
    subscription_id      = "{{ azure.subscription_id }}"
    tenant_id            = "{{ azure.tenant_id }}"
  }
}
"#;

pub(super) fn factory(tools: ProviderTools) -> Box<dyn Provider> {
    Box::new(AzureProvider::new(tools))
}

/// Storage account name derived from the project name: lowercase
/// alphanumerics only, at most 24 characters.
pub fn storage_account_name(name: &ProjectName) -> String {
    let mut account: String = name
        .as_str()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    account.truncate(STORAGE_ACCOUNT_MAX - STORAGE_ACCOUNT_SUFFIX.len());
    account.push_str(STORAGE_ACCOUNT_SUFFIX);
    account
}

#[derive(Debug, Clone)]
pub struct AzureProvider {
    tools: ProviderTools,
}

impl AzureProvider {
    pub fn new(tools: ProviderTools) -> Self {
        Self { tools }
    }

    fn config(state: &ProjectState) -> Result<&AzureConfig> {
        state
            .azure
            .as_ref()
            .ok_or_else(|| Error::validation("azure configuration missing; re-run init"))
    }

    fn az(&self, config: &AzureConfig) -> CommandSpec {
        CommandSpec::new("az")
            .args(["--subscription", config.subscription_id.as_str()])
            .args(["--output", "none"])
            .timeout(self.tools.command_timeout)
    }
}

#[async_trait]
impl Provider for AzureProvider {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn configure(&self, state: &mut ProjectState, options: &ProviderOptions) -> Result<()> {
        let existing = state.azure.take().unwrap_or_default();
        let pick = |flag: &Option<String>, current: String| flag.clone().unwrap_or(current);

        state.azure = Some(AzureConfig {
            resource_group: pick(&options.azure_resource_group, existing.resource_group),
            subscription_id: pick(&options.azure_subscription_id, existing.subscription_id),
            tenant_id: pick(&options.azure_tenant_id, existing.tenant_id),
            storage_account: storage_account_name(&state.name),
        });
        Ok(())
    }

    fn templates(&self, state: &ProjectState) -> Vec<Template> {
        let layout = state.layout();
        vec![
            Template::new("baking variables", layout.baking.var_file.clone(), BAKING_VARS),
            template::layer_vars(state, DeployLayer::Infrastructure, INFRASTRUCTURE_VARS),
            template::backend(state, DeployLayer::Infrastructure, BACKEND),
            template::layer_vars(
                state,
                DeployLayer::Platform,
                format!("{}{PLATFORM_EXTRA_VARS}", template::PLATFORM_VARS),
            ),
            template::backend(state, DeployLayer::Platform, BACKEND),
            template::layer_vars(
                state,
                DeployLayer::ApplicationSupport,
                template::APPLICATION_VARS,
            ),
            template::backend(state, DeployLayer::ApplicationSupport, BACKEND),
        ]
    }

    fn validate_configuration(&self, state: &ProjectState) -> Result<()> {
        validate_common(state)?;

        let config = Self::config(state)?;
        required(&config.resource_group, "--azure-resource-group")?;
        required(&config.subscription_id, "--azure-subscription-id")?;
        required(&config.tenant_id, "--azure-tenant-id")?;

        let account = &config.storage_account;
        let valid_chars = account
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !(STORAGE_ACCOUNT_MIN..=STORAGE_ACCOUNT_MAX).contains(&account.len()) || !valid_chars {
            return Err(Error::validation(format!(
                "storage account '{account}' must be {STORAGE_ACCOUNT_MIN} to {STORAGE_ACCOUNT_MAX} lowercase letters or digits"
            )));
        }
        Ok(())
    }

    fn environment(&self, state: &ProjectState) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        if let Some(config) = &state.azure {
            env.insert("ARM_SUBSCRIPTION_ID".to_string(), config.subscription_id.clone());
            env.insert("ARM_TENANT_ID".to_string(), config.tenant_id.clone());
        }
        env
    }

    fn driver(&self) -> &LifecycleDriver {
        &self.tools.driver
    }

    async fn init_provider(&self, state: &ProjectState) -> Result<()> {
        let config = Self::config(state)?;
        let runner = self.tools.runner.as_ref();
        let account = config.storage_account.as_str();
        let group = config.resource_group.as_str();

        let create_group = self.az(config).args([
            "group",
            "create",
            "--name",
            group,
            "--location",
            state.region.as_str(),
        ]);
        cli::create(runner, create_group).await?;

        let create_account = self.az(config).args([
            "storage",
            "account",
            "create",
            "--name",
            account,
            "--resource-group",
            group,
            "--location",
            state.region.as_str(),
            "--sku",
            "Standard_LRS",
        ]);
        cli::create(runner, create_account).await?;

        let versioning = self.az(config).args([
            "storage",
            "account",
            "blob-service-properties",
            "update",
            "--account-name",
            account,
            "--resource-group",
            group,
            "--enable-versioning",
            "true",
        ]);
        runner.run_checked(&versioning).await?;

        let create_container = self.az(config).args([
            "storage",
            "container",
            "create",
            "--name",
            STATE_CONTAINER,
            "--account-name",
            account,
            "--auth-mode",
            "login",
        ]);
        cli::create(runner, create_container).await?;

        tracing::info!(account, group, "azure state store ready");
        Ok(())
    }

    async fn bake(&self, state: &mut ProjectState) -> Result<()> {
        let env = self.environment(state);
        self.tools.driver.bake(state, &env).await
    }

    async fn deploy(&self, state: &mut ProjectState, layer: DeployLayer) -> Result<()> {
        let env = self.environment(state);
        self.tools.driver.deploy(state, layer, &env).await
    }

    async fn destroy(
        &self,
        state: &mut ProjectState,
        layer: DeployLayer,
        force: bool,
        diag: &mut Diagnostics,
    ) -> Result<()> {
        let env = self.environment(state);
        self.tools.driver.destroy(state, layer, &env, force, diag).await
    }

    async fn clean_provider(&self, state: &ProjectState) -> Result<()> {
        let config = Self::config(state)?;

        let delete_account = self.az(config).args([
            "storage",
            "account",
            "delete",
            "--name",
            config.storage_account.as_str(),
            "--resource-group",
            config.resource_group.as_str(),
            "--yes",
        ]);
        cli::remove(self.tools.runner.as_ref(), delete_account).await?;

        tracing::info!(account = %config.storage_account, "azure state store removed");
        Ok(())
    }

    async fn status(&self, state: &ProjectState) -> StatusReport {
        self.tools.driver.status(state).await
    }
}
