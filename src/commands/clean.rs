// ABOUTME: Clean command: destroy every layer in reverse, then remove the state store.
// ABOUTME: Layer destroy failures are warnings; the command always runs to the end.

use super::CommandContext;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::Result;
use crate::state::{DeployLayer, ProjectState, Status};

/// Tear the project down and forget it.
///
/// Without `force`, a failure to remove the state store keeps the local
/// state so the clean can be retried. `force` never touches the run lock;
/// only `break_lock` does.
pub async fn clean(ctx: &mut CommandContext, force: bool, break_lock: bool) -> Result<()> {
    if !ProjectState::exists(&ctx.root) {
        ctx.output.success("Nothing to clean, already clean");
        return Ok(());
    }

    ctx.output.start_timer();
    let mut diag = Diagnostics::default();
    let lock = ctx.lock(None, break_lock)?;

    let result = teardown(ctx, force, &mut diag).await;

    ctx.release(lock, &mut diag);
    ctx.report(&diag);

    let name = result?;
    // Only the lock lived next to the state file; a leftover entry is harmless.
    let state_dir = ctx.root.join(crate::state::STATE_DIR);
    if let Err(e) = std::fs::remove_dir(&state_dir) {
        tracing::debug!(dir = %state_dir.display(), error = %e, "state directory left in place");
    }

    ctx.output.success(&format!("Project {name} cleaned"));
    Ok(())
}

async fn teardown(ctx: &CommandContext, force: bool, diag: &mut Diagnostics) -> Result<String> {
    let mut state = ProjectState::load_from_storage(&ctx.root)?;
    let provider = ctx.provider(&state.provider)?;

    ctx.output.progress(&format!(
        "Cleaning {} on {} ({})",
        state.name,
        state.provider,
        state.status.describe()
    ));

    for layer in DeployLayer::ORDERED.into_iter().rev() {
        ctx.output.progress(&format!("  → Destroying {layer}..."));
        provider.destroy(&mut state, layer, force, diag).await?;
    }

    if state.status > Status::InitMissing {
        ctx.output.progress("  → Removing state store...");
        if let Err(e) = provider.clean_provider(&state).await {
            if !force {
                return Err(e);
            }
            diag.warn(Warning::provider_clean_failed(format!(
                "failed to remove {} state store, continuing because of --force: {e}",
                state.provider
            )));
        }
    }

    let name = state.name.to_string();
    state.remove_from_storage()?;
    Ok(name)
}
