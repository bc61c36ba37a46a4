// ABOUTME: Thin wrapper over the terraform CLI.
// ABOUTME: Builds init/apply/destroy invocations and runs them through a CommandRunner.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::process::{CommandRunner, CommandSpec, ToolError};

pub const DEFAULT_BINARY: &str = "terraform";

/// Timeout for `terraform init`, which only downloads providers and modules.
const INIT_TIMEOUT: Duration = Duration::from_secs(300);

/// One terraform run against a working directory.
#[derive(Debug, Clone, Copy)]
pub struct TerraformRun<'a> {
    pub dir: &'a Path,
    pub var_file: &'a Path,
    pub env: &'a BTreeMap<String, String>,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct Terraform {
    runner: Arc<dyn CommandRunner>,
    binary: String,
}

impl std::fmt::Debug for Terraform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terraform")
            .field("binary", &self.binary)
            .finish()
    }
}

impl Terraform {
    pub fn new(runner: Arc<dyn CommandRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    fn command(&self, run: &TerraformRun<'_>, subcommand: &str) -> CommandSpec {
        CommandSpec::new(&self.binary)
            .arg(subcommand)
            .current_dir(run.dir)
            .envs(run.env)
            .timeout(run.timeout)
    }

    fn var_file_arg(run: &TerraformRun<'_>) -> String {
        format!("-var-file={}", run.var_file.display())
    }

    /// `terraform init`, configuring the backend declared in the working directory.
    pub async fn init(&self, run: &TerraformRun<'_>) -> Result<(), ToolError> {
        let spec = self
            .command(run, "init")
            .args(["-input=false", "-no-color"])
            .timeout(INIT_TIMEOUT.min(run.timeout));
        self.runner.run_checked(&spec).await?;
        Ok(())
    }

    /// `terraform apply -auto-approve -var-file=…`, optionally limited to `targets`.
    pub async fn apply(&self, run: &TerraformRun<'_>, targets: &[&str]) -> Result<(), ToolError> {
        let spec = self
            .command(run, "apply")
            .args(["-auto-approve", "-input=false", "-no-color"])
            .arg(Self::var_file_arg(run))
            .args(targets.iter().map(|t| format!("-target={t}")));
        self.runner.run_checked(&spec).await?;
        Ok(())
    }

    /// `terraform destroy -auto-approve -var-file=…`.
    pub async fn destroy(&self, run: &TerraformRun<'_>) -> Result<(), ToolError> {
        let spec = self
            .command(run, "destroy")
            .args(["-auto-approve", "-input=false", "-no-color"])
            .arg(Self::var_file_arg(run));
        self.runner.run_checked(&spec).await?;
        Ok(())
    }
}
