// ABOUTME: Provider-agnostic bake/deploy/destroy over the three terraform layers.
// ABOUTME: Persists a Running checkpoint before each external run and Done after it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::report::{ServiceVersions, StatusReport};
use super::secrets;
use crate::config::{ProbeConfig, Settings, TimeoutsConfig};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::probe::{Endpoints, HealthProber, ProbeTarget, VersionSource};
use crate::process::{CommandRunner, ToolError};
use crate::state::{DeployLayer, LayerPaths, ProjectState, Status};
use crate::terraform::{Terraform, TerraformRun};

/// Module applied on its own once the mesh CA is ready.
pub const MESH_TARGET: &str = "module.consul_config";

const NOMAD_TOKEN_HEADER: &str = "X-Nomad-Token";

/// Drives terraform and the health gates for one project.
///
/// Providers hold a driver and call into it explicitly, passing the
/// environment their credentials need.
#[derive(Debug, Clone)]
pub struct LifecycleDriver {
    terraform: Terraform,
    prober: HealthProber,
    probe: ProbeConfig,
    timeouts: TimeoutsConfig,
    endpoints: Option<Endpoints>,
}

impl LifecycleDriver {
    pub fn new(runner: Arc<dyn CommandRunner>, settings: &Settings) -> Self {
        Self {
            terraform: Terraform::new(runner, settings.terraform.binary.clone()),
            prober: HealthProber::new(settings.probe.timeout),
            probe: settings.probe.clone(),
            timeouts: settings.timeouts.clone(),
            endpoints: None,
        }
    }

    /// Use fixed service endpoints instead of deriving them from the domain.
    pub fn with_endpoints(mut self, endpoints: Option<Endpoints>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn prober(&self) -> &HealthProber {
        &self.prober
    }

    /// Endpoints of the cluster services.
    pub fn endpoints(&self, state: &ProjectState) -> Result<Endpoints> {
        match &self.endpoints {
            Some(endpoints) => Ok(endpoints.clone()),
            None => Ok(Endpoints::for_domain(state.require_domain("reaching cluster services")?)),
        }
    }

    /// CA bundle written by the infrastructure layer, once it exists.
    fn ca_bundle(state: &ProjectState) -> Option<PathBuf> {
        let path = &state.layout().ca_bundle;
        path.is_file().then(|| path.clone())
    }

    /// Process environment for a terraform run against `layer`.
    pub fn layer_env(
        &self,
        state: &ProjectState,
        layer: DeployLayer,
        provider_env: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut env = provider_env.clone();
        if !layer.needs_secrets() {
            return env;
        }

        if let Some(token) = &state.vault_root_token {
            env.insert("VAULT_TOKEN".to_string(), token.clone());
        }
        if let Some(token) = &state.nomad_token {
            env.insert("NOMAD_TOKEN".to_string(), token.clone());
        }
        if let Ok(endpoints) = self.endpoints(state) {
            env.insert("VAULT_ADDR".to_string(), endpoints.vault);
            env.insert("CONSUL_HTTP_ADDR".to_string(), endpoints.consul);
            env.insert("NOMAD_ADDR".to_string(), endpoints.nomad);
        }
        if let Some(ca) = Self::ca_bundle(state) {
            env.insert("VAULT_CACERT".to_string(), ca.display().to_string());
        }
        env
    }

    fn run<'a>(
        &self,
        paths: &'a LayerPaths,
        env: &'a BTreeMap<String, String>,
        timeout: std::time::Duration,
    ) -> TerraformRun<'a> {
        TerraformRun {
            dir: &paths.dir,
            var_file: &paths.var_file,
            env,
            timeout,
        }
    }

    /// Build machine images. Always runs; raises the status to `BakingDone`
    /// only when it is lower.
    pub async fn bake(
        &self,
        state: &mut ProjectState,
        provider_env: &BTreeMap<String, String>,
    ) -> Result<()> {
        if state.status < Status::InitDone {
            return Err(Error::validation("bake requires an initialized project"));
        }

        let paths = state.layout().baking.clone();
        let run = self.run(&paths, provider_env, self.timeouts.bake);

        tracing::info!(project = %state.name, dir = %paths.dir.display(), "baking images");
        self.terraform.init(&run).await?;
        self.terraform.apply(&run, &[]).await?;

        if state.status < Status::BakingDone {
            state.advance(Status::BakingDone)?;
        }
        Ok(())
    }

    /// Apply `layer`.
    ///
    /// A no-op when the layer is already deployed. On failure the status
    /// stays at the layer's Running checkpoint so the next run retries.
    pub async fn deploy(
        &self,
        state: &mut ProjectState,
        layer: DeployLayer,
        provider_env: &BTreeMap<String, String>,
    ) -> Result<()> {
        if state.status >= layer.deploy_done() {
            tracing::debug!(project = %state.name, %layer, status = %state.status, "layer already deployed");
            return Ok(());
        }

        let required = layer.prerequisite();
        if state.status < required {
            return Err(Error::validation(format!(
                "{layer} layer requires status {required}, project is at {}",
                state.status
            )));
        }
        if layer.needs_secrets() && (state.vault_root_token.is_none() || state.nomad_token.is_none())
        {
            return Err(Error::Secret(format!(
                "{layer} layer needs the vault root token and the nomad token"
            )));
        }

        let env = self.layer_env(state, layer, provider_env);
        state.advance(layer.deploy_running())?;

        let paths = state.layout().layer(layer).clone();
        let run = self.run(&paths, &env, self.timeouts.layer);
        self.terraform.init(&run).await?;
        self.terraform.apply(&run, &[]).await?;

        state.advance(layer.deploy_done())
    }

    /// Destroy `layer`.
    ///
    /// Skipped unless the project reached the layer's clean-running
    /// checkpoint. Terraform failures are recorded in `diag` and never
    /// returned, with or without `force`; the status always ends at the
    /// layer's `CleanDone`. Only persistence errors propagate.
    pub async fn destroy(
        &self,
        state: &mut ProjectState,
        layer: DeployLayer,
        provider_env: &BTreeMap<String, String>,
        force: bool,
        diag: &mut Diagnostics,
    ) -> Result<()> {
        if state.status < layer.clean_running() {
            tracing::debug!(project = %state.name, %layer, status = %state.status, "nothing to destroy");
            return Ok(());
        }

        let env = self.layer_env(state, layer, provider_env);
        state.advance(layer.clean_running())?;

        let paths = state.layout().layer(layer).clone();
        let run = self.run(&paths, &env, self.timeouts.layer);
        if let Err(e) = self.destroy_layer(&run).await {
            let message = if force {
                format!("{layer} destroy failed, continuing because of --force: {e}")
            } else {
                format!("{layer} destroy failed, cloud resources may remain: {e}")
            };
            diag.warn(Warning::destroy_failed(message));
        }

        // Tokens belong to the destroyed cluster; the root token file is kept.
        if layer == DeployLayer::Infrastructure {
            state.clear_cluster_secrets();
        }
        state.advance(layer.clean_done())
    }

    async fn destroy_layer(&self, run: &TerraformRun<'_>) -> std::result::Result<(), ToolError> {
        self.terraform.init(run).await?;
        self.terraform.destroy(run).await
    }

    async fn poll(&self, target: &ProbeTarget, state: &ProjectState) -> Result<()> {
        let ca = Self::ca_bundle(state);
        self.prober
            .poll(target, ca.as_deref(), self.probe.attempts, self.probe.interval)
            .await?;
        Ok(())
    }

    /// Wait for the secrets manager, mesh and scheduler to answer.
    pub async fn check_infrastructure(&self, state: &mut ProjectState) -> Result<()> {
        if state.status >= Status::InfraCheckDone {
            return Ok(());
        }
        if state.status < Status::InfraDeployDone {
            return Err(Error::validation(
                "infrastructure must be deployed before its services can be checked",
            ));
        }

        let endpoints = self.endpoints(state)?;
        state.advance(Status::InfraCheckRunning)?;
        for target in endpoints.infrastructure_gates() {
            self.poll(&target, state).await?;
        }
        state.advance(Status::InfraCheckDone)
    }

    /// Obtain whichever of the root token and scheduler token is missing.
    pub async fn acquire_secrets(&self, state: &mut ProjectState) -> Result<()> {
        if state.vault_root_token.is_none() {
            let token = secrets::read_root_token(&state.layout().root_token_file)?;
            state.set_vault_root_token(token)?;
            tracing::info!(project = %state.name, "stored vault root token");
        }

        if state.nomad_token.is_none() {
            let root_token = state
                .vault_root_token
                .clone()
                .ok_or_else(|| Error::Secret("vault root token missing".to_string()))?;
            let endpoints = self.endpoints(state)?;
            let ca = Self::ca_bundle(state);
            let token = secrets::request_nomad_token(
                &self.prober,
                &endpoints.nomad_bootstrap_creds(),
                ca.as_deref(),
                &root_token,
            )
            .await?;
            state.set_nomad_token(token)?;
        }
        Ok(())
    }

    /// Apply the mesh configuration module once the connect CA is ready.
    pub async fn configure_mesh(
        &self,
        state: &mut ProjectState,
        provider_env: &BTreeMap<String, String>,
    ) -> Result<()> {
        if state.status >= Status::PlatformConsulDeployDone {
            return Ok(());
        }
        if state.status < Status::PlatformDeployDone {
            return Err(Error::validation(
                "platform must be deployed before the mesh can be configured",
            ));
        }

        let endpoints = self.endpoints(state)?;
        self.poll(&endpoints.connect_ca_roots(), state).await?;

        let env = self.layer_env(state, DeployLayer::Platform, provider_env);
        state.advance(Status::PlatformConsulDeployRunning)?;

        let paths = state.layout().platform.clone();
        let run = self.run(&paths, &env, self.timeouts.layer);
        self.terraform.apply(&run, &[MESH_TARGET]).await?;

        state.advance(Status::PlatformConsulDeployDone)
    }

    /// Identity, position and best-effort versions. Never fails.
    pub async fn status(&self, state: &ProjectState) -> StatusReport {
        let endpoints = self.endpoints(state).ok();
        let versions = match &endpoints {
            Some(endpoints) if state.status >= Status::InfraDeployDone => {
                Some(self.versions(state, endpoints).await)
            }
            _ => None,
        };

        StatusReport {
            name: state.name.to_string(),
            provider: state.provider.clone(),
            region: state.region.clone(),
            edition: state.edition,
            status: state.status,
            endpoints,
            versions,
        }
    }

    async fn versions(&self, state: &ProjectState, endpoints: &Endpoints) -> ServiceVersions {
        let ca = Self::ca_bundle(state);
        let ca = ca.as_deref();
        let nomad_header = state
            .nomad_token
            .as_deref()
            .map(|token| (NOMAD_TOKEN_HEADER, token));

        ServiceVersions {
            vault: self
                .prober
                .version(
                    &endpoints.vault_health().url,
                    ca,
                    &VersionSource::json("/version"),
                    None,
                )
                .await,
            consul: self
                .prober
                .version(&endpoints.consul_ui(), ca, &VersionSource::consul_ui_marker(), None)
                .await,
            nomad: self
                .prober
                .version(
                    &endpoints.nomad_agent_self(),
                    ca,
                    &VersionSource::json("/config/Version/Version"),
                    nomad_header,
                )
                .await,
        }
    }
}
