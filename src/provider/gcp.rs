// ABOUTME: Google Cloud provider: GCS state bucket and a terraform service account.
// ABOUTME: The service-account key is written into the infrastructure checkout.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{Provider, ProviderOptions, ProviderTools, cli, required, validate_common};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::lifecycle::{LifecycleDriver, StatusReport};
use crate::process::CommandSpec;
use crate::state::{DeployLayer, GcpConfig, ProjectState};
use crate::template::{self, Template};

pub const TAG: &str = "gcp";

/// Role granted to the terraform service account on the parent project.
const SERVICE_ACCOUNT_ROLE: &str = "roles/owner";

const MIN_NAME_LEN: usize = 6;
const MAX_NAME_LEN: usize = 30;

pub const REGIONS: &[&str] = &[
    "us-central1",
    "us-east1",
    "us-east4",
    "us-west1",
    "us-west2",
    "northamerica-northeast1",
    "southamerica-east1",
    "europe-north1",
    "europe-west1",
    "europe-west2",
    "europe-west3",
    "europe-west4",
    "europe-west6",
    "europe-west8",
    "asia-east1",
    "asia-northeast1",
    "asia-southeast1",
    "australia-southeast1",
];

const BAKING_VARS: &str = r#"build_on_google    = true
build_image_name   = "caravan-os"
google_project_id  = "{{ gcp.parent_project }}"
google_account_file = "{{ paths.service_account_key }}"
google_region      = "{{ region }}"
edition            = "{{ edition }}"
"#;

const INFRASTRUCTURE_VARS: &str = r#"region                 = "{{ region }}"
project_id             = "{{ name }}"
prefix                 = "{{ name }}"
parent_project_id      = "{{ gcp.parent_project }}"
google_account_file    = "{{ paths.service_account_key }}"
external_domain        = "{{ domain }}"
use_le_staging         = true
ca_certs_file          = "{{ paths.ca_bundle }}"
root_token_file        = "{{ paths.root_token_file }}"
{%- if gcp.organization_id is defined %}
organization_id        = "{{ gcp.organization_id }}"
{%- endif %}
{%- if gcp.billing_account is defined %}
billing_account_id     = "{{ gcp.billing_account }}"
{%- endif %}
"#;

const PLATFORM_EXTRA_VARS: &str = r#"google_project_id   = "{{ name }}"
google_account_file = "{{ paths.service_account_key }}"
"#;

const BACKEND: &str = r#"terraform {
  backend "gcs" {
    bucket      = "{{ state_store_name }}"
    prefix      = "{{ layer }}/terraform/state"
    credentials = "{{ paths.service_account_key }}"
  }
}
"#;

pub(super) fn factory(tools: ProviderTools) -> Box<dyn Provider> {
    Box::new(GcpProvider::new(tools))
}

#[derive(Debug, Clone)]
pub struct GcpProvider {
    tools: ProviderTools,
}

impl GcpProvider {
    pub fn new(tools: ProviderTools) -> Self {
        Self { tools }
    }

    fn config(state: &ProjectState) -> Result<&GcpConfig> {
        state
            .gcp
            .as_ref()
            .ok_or_else(|| Error::validation("gcp configuration missing; re-run init"))
    }

    fn service_account_id(state: &ProjectState) -> String {
        format!("{}-terraform", state.name)
    }

    fn gcloud(&self, config: &GcpConfig) -> CommandSpec {
        CommandSpec::new("gcloud")
            .args(["--project", config.parent_project.as_str(), "--quiet"])
            .timeout(self.tools.command_timeout)
    }
}

#[async_trait]
impl Provider for GcpProvider {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn configure(&self, state: &mut ProjectState, options: &ProviderOptions) -> Result<()> {
        let existing = state.gcp.take().unwrap_or_default();
        let parent_project = options
            .gcp_parent_project
            .clone()
            .unwrap_or(existing.parent_project);

        state.gcp = Some(GcpConfig {
            service_account: format!(
                "{}@{parent_project}.iam.gserviceaccount.com",
                Self::service_account_id(state)
            ),
            parent_project,
            organization_id: options
                .gcp_organization_id
                .clone()
                .or(existing.organization_id),
            billing_account: options
                .gcp_billing_account
                .clone()
                .or(existing.billing_account),
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

        // The project name doubles as the GCP project id.
        let name = state.name.as_str();
        if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name.len()) {
            return Err(Error::validation(format!(
                "project name '{name}' must be {MIN_NAME_LEN} to {MAX_NAME_LEN} characters on gcp"
            )));
        }
        if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(Error::validation(format!(
                "project name '{name}' must start with a letter on gcp"
            )));
        }

        if !REGIONS.contains(&state.region.as_str()) {
            return Err(Error::validation(format!(
                "region '{}' is not supported on gcp; use one of: {}",
                state.region,
                REGIONS.join(", ")
            )));
        }

        required(&Self::config(state)?.parent_project, "--gcp-parent-project")
    }

    fn environment(&self, state: &ProjectState) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(
            "GOOGLE_APPLICATION_CREDENTIALS".to_string(),
            state.layout().service_account_key.display().to_string(),
        );
        env
    }

    fn driver(&self) -> &LifecycleDriver {
        &self.tools.driver
    }

    async fn init_provider(&self, state: &ProjectState) -> Result<()> {
        let config = Self::config(state)?;
        let runner = self.tools.runner.as_ref();

        let create_account = self.gcloud(config).args([
            "iam".to_string(),
            "service-accounts".to_string(),
            "create".to_string(),
            Self::service_account_id(state),
            "--display-name".to_string(),
            format!("{} terraform", state.name),
        ]);
        cli::create(runner, create_account).await?;

        let bind_role = self.gcloud(config).args([
            "projects".to_string(),
            "add-iam-policy-binding".to_string(),
            config.parent_project.clone(),
            "--member".to_string(),
            format!("serviceAccount:{}", config.service_account),
            "--role".to_string(),
            SERVICE_ACCOUNT_ROLE.to_string(),
        ]);
        runner.run_checked(&bind_role).await?;

        // Every run would otherwise mint a new key.
        let key_file = &state.layout().service_account_key;
        if !key_file.is_file() {
            if let Some(dir) = key_file.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let create_key = self.gcloud(config).args([
                "iam".to_string(),
                "service-accounts".to_string(),
                "keys".to_string(),
                "create".to_string(),
                key_file.display().to_string(),
                "--iam-account".to_string(),
                config.service_account.clone(),
            ]);
            runner.run_checked(&create_key).await?;
        }

        let bucket = format!("gs://{}", state.state_store_name);
        let create_bucket = self.gcloud(config).args([
            "storage",
            "buckets",
            "create",
            bucket.as_str(),
            "--location",
            state.region.as_str(),
            "--uniform-bucket-level-access",
        ]);
        cli::create(runner, create_bucket).await?;

        let versioning = self.gcloud(config).args([
            "storage",
            "buckets",
            "update",
            bucket.as_str(),
            "--versioning",
        ]);
        runner.run_checked(&versioning).await?;

        tracing::info!(%bucket, account = %config.service_account, "gcp state store ready");
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
        let runner = self.tools.runner.as_ref();

        let bucket = format!("gs://{}", state.state_store_name);
        let delete_bucket =
            self.gcloud(config)
                .args(["storage", "rm", "--recursive", bucket.as_str()]);
        cli::remove(runner, delete_bucket).await?;

        let delete_account = self.gcloud(config).args([
            "iam",
            "service-accounts",
            "delete",
            config.service_account.as_str(),
        ]);
        cli::remove(runner, delete_account).await?;

        tracing::info!(%bucket, "gcp state store removed");
        Ok(())
    }

    async fn status(&self, state: &ProjectState) -> StatusReport {
        self.tools.driver.status(state).await
    }
}
