// ABOUTME: Amazon Web Services provider: S3 state bucket, DynamoDB lock table.
// ABOUTME: Baseline resources are created with the aws CLI under the configured profile.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{Provider, ProviderOptions, ProviderTools, cli, required, validate_common};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::lifecycle::{LifecycleDriver, StatusReport};
use crate::process::CommandSpec;
use crate::state::{AwsConfig, DeployLayer, ProjectState};
use crate::template::{self, Template};

pub const TAG: &str = "aws";

pub const DEFAULT_PROFILE: &str = "default";

/// Longest S3 bucket name.
const MAX_BUCKET_LEN: usize = 63;

/// Commercial regions the layer modules are tested against.
pub const REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "sa-east-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "eu-north-1",
    "eu-south-1",
    "ap-south-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-southeast-1",
    "ap-southeast-2",
];

const BAKING_VARS: &str = r#"build_on_aws      = true
build_image_name  = "caravan-os"
aws_region        = "{{ region }}"
aws_instance_type = "t3.small"
aws_profile       = "{{ aws.profile }}"
edition           = "{{ edition }}"
"#;

const INFRASTRUCTURE_VARS: &str = r#"region                  = "{{ region }}"
awsprofile              = "{{ aws.profile }}"
shared_credentials_file = "~/.aws/credentials"
prefix                  = "{{ name }}"
personal_ip_list        = ["0.0.0.0/0"]
use_le_staging          = true
external_domain         = "{{ domain }}"
ca_certs_file           = "{{ paths.ca_bundle }}"
root_token_file         = "{{ paths.root_token_file }}"
"#;

const PLATFORM_EXTRA_VARS: &str = r#"aws_region        = "{{ region }}"
aws_profile       = "{{ aws.profile }}"
"#;

const BACKEND: &str = r#"terraform {
  backend "s3" {
    bucket         = "{{ state_store_name }}"
    key            = "{{ layer }}/terraform/state/terraform.tfstate"
    region         = "{{ region }}"
    dynamodb_table = "{{ lock_name }}"
    profile        = "{{ aws.profile }}"
  }
}
"#;

pub(super) fn factory(tools: ProviderTools) -> Box<dyn Provider> {
    Box::new(AwsProvider::new(tools))
}

#[derive(Debug, Clone)]
pub struct AwsProvider {
    tools: ProviderTools,
}

impl AwsProvider {
    pub fn new(tools: ProviderTools) -> Self {
        Self { tools }
    }

    fn config(state: &ProjectState) -> Result<&AwsConfig> {
        state
            .aws
            .as_ref()
            .ok_or_else(|| Error::validation("aws configuration missing; re-run init"))
    }

    fn aws(&self, state: &ProjectState, config: &AwsConfig) -> CommandSpec {
        CommandSpec::new("aws")
            .args(["--region", state.region.as_str()])
            .args(["--profile", config.profile.as_str()])
            .timeout(self.tools.command_timeout)
    }
}

#[async_trait]
impl Provider for AwsProvider {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn configure(&self, state: &mut ProjectState, options: &ProviderOptions) -> Result<()> {
        let profile = match (&options.aws_profile, &state.aws) {
            (Some(profile), _) => profile.clone(),
            (None, Some(existing)) => existing.profile.clone(),
            (None, None) => DEFAULT_PROFILE.to_string(),
        };
        state.aws = Some(AwsConfig { profile });
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

        if !REGIONS.contains(&state.region.as_str()) {
            return Err(Error::validation(format!(
                "region '{}' is not supported on aws; use one of: {}",
                state.region,
                REGIONS.join(", ")
            )));
        }

        if state.state_store_name.len() > MAX_BUCKET_LEN {
            return Err(Error::validation(format!(
                "project name '{}' is too long for aws: bucket '{}' exceeds {MAX_BUCKET_LEN} characters",
                state.name, state.state_store_name
            )));
        }

        required(&Self::config(state)?.profile, "--aws-profile")
    }

    fn environment(&self, state: &ProjectState) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        if let Some(config) = &state.aws {
            env.insert("AWS_PROFILE".to_string(), config.profile.clone());
        }
        env
    }

    fn driver(&self) -> &LifecycleDriver {
        &self.tools.driver
    }

    async fn init_provider(&self, state: &ProjectState) -> Result<()> {
        let config = Self::config(state)?;
        let runner = self.tools.runner.as_ref();
        let bucket = state.state_store_name.as_str();

        let mut create_bucket = self
            .aws(state, config)
            .args(["s3api", "create-bucket", "--bucket", bucket]);
        // us-east-1 rejects an explicit location constraint.
        if state.region != "us-east-1" {
            create_bucket = create_bucket.args([
                "--create-bucket-configuration".to_string(),
                format!("LocationConstraint={}", state.region),
            ]);
        }
        cli::create(runner, create_bucket).await?;

        let versioning = self.aws(state, config).args([
            "s3api",
            "put-bucket-versioning",
            "--bucket",
            bucket,
            "--versioning-configuration",
            "Status=Enabled",
        ]);
        runner.run_checked(&versioning).await?;

        let lock_table = self.aws(state, config).args([
            "dynamodb",
            "create-table",
            "--table-name",
            state.lock_name.as_str(),
            "--attribute-definitions",
            "AttributeName=LockID,AttributeType=S",
            "--key-schema",
            "AttributeName=LockID,KeyType=HASH",
            "--billing-mode",
            "PAY_PER_REQUEST",
        ]);
        cli::create(runner, lock_table).await?;

        tracing::info!(bucket, table = %state.lock_name, "aws state store ready");
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

        let delete_table = self.aws(state, config).args([
            "dynamodb",
            "delete-table",
            "--table-name",
            state.lock_name.as_str(),
        ]);
        cli::remove(runner, delete_table).await?;

        let delete_bucket = self.aws(state, config).args([
            "s3".to_string(),
            "rb".to_string(),
            format!("s3://{}", state.state_store_name),
            "--force".to_string(),
        ]);
        cli::remove(runner, delete_bucket).await?;

        tracing::info!(bucket = %state.state_store_name, "aws state store removed");
        Ok(())
    }

    async fn status(&self, state: &ProjectState) -> StatusReport {
        self.tools.driver.status(state).await
    }
}
