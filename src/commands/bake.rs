// ABOUTME: Bake command: build machine images for the project's provider.
// ABOUTME: Initializes the project first when needed.

use super::CommandContext;
use super::init::{InitArgs, initialize};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::state::ProjectState;

/// Bake images, initializing the project on the way if it is not yet.
pub async fn bake(ctx: &mut CommandContext, args: InitArgs) -> Result<ProjectState> {
    ctx.output.start_timer();
    let mut diag = Diagnostics::default();
    let lock = ctx.lock(args.project.as_deref(), args.break_lock)?;

    let result = bake_images(ctx, &args).await;

    ctx.release(lock, &mut diag);
    ctx.report(&diag);

    let state = result?;
    ctx.output.success("Images baked");
    Ok(state)
}

async fn bake_images(ctx: &CommandContext, args: &InitArgs) -> Result<ProjectState> {
    let (mut state, provider) = initialize(ctx, args).await?;

    ctx.output.progress(&format!(
        "Baking images for {} on {}",
        state.name, state.provider
    ));
    provider.bake(&mut state).await?;
    Ok(state)
}
