// ABOUTME: Up command: deploy every layer in order with health gates in between.
// ABOUTME: Each step is skipped when already done, so an interrupted run can simply be repeated.

use super::CommandContext;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::state::{DeployLayer, ProjectState, Status};

/// Bring the whole cluster up.
pub async fn up(ctx: &mut CommandContext, break_lock: bool) -> Result<ProjectState> {
    ctx.output.start_timer();
    let mut diag = Diagnostics::default();
    let lock = ctx.lock(None, break_lock)?;

    let result = deploy_all(ctx).await;

    ctx.release(lock, &mut diag);
    ctx.report(&diag);

    let state = result?;
    let vault = state.vault_url.as_deref().unwrap_or("(no domain)");
    ctx.output
        .success(&format!("Caravan {} is up, vault at {vault}", state.name));
    Ok(state)
}

async fn deploy_all(ctx: &CommandContext) -> Result<ProjectState> {
    let mut state = match ProjectState::load_from_storage(&ctx.root) {
        Ok(state) => state,
        Err(e) if e.is_not_found() => {
            return Err(Error::validation("no project in this workspace; run init first"));
        }
        Err(e) => return Err(e),
    };

    if state.status < Status::InitDone {
        return Err(Error::validation(format!(
            "project {} is not initialized ({}); run init first",
            state.name,
            state.status.describe()
        )));
    }

    let provider = ctx.provider(&state.provider)?;
    provider.validate_configuration(&state)?;
    let driver = provider.driver();

    if state.status.is_running() {
        ctx.output.progress(&format!(
            "Resuming {} from an interrupted run ({})",
            state.name,
            state.status.describe()
        ));
    }

    ctx.output.progress("  → Deploying infrastructure...");
    provider.deploy(&mut state, DeployLayer::Infrastructure).await?;

    ctx.output.progress("  → Waiting for vault, consul and nomad...");
    driver.check_infrastructure(&mut state).await?;

    ctx.output.progress("  → Acquiring cluster tokens...");
    driver.acquire_secrets(&mut state).await?;

    ctx.output.progress("  → Deploying platform...");
    provider.deploy(&mut state, DeployLayer::Platform).await?;

    ctx.output.progress("  → Configuring service mesh...");
    let env = provider.environment(&state);
    driver.configure_mesh(&mut state, &env).await?;

    ctx.output.progress("  → Deploying application support...");
    provider
        .deploy(&mut state, DeployLayer::ApplicationSupport)
        .await?;

    Ok(state)
}
