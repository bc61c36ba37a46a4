// ABOUTME: Init command: create or resume a project, check out layers, render files.
// ABOUTME: Validation runs before anything is persisted or any cloud resource is created.

use super::CommandContext;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::provider::{Provider, ProviderOptions};
use crate::source;
use crate::state::{ProjectState, Status};
use crate::template;
use crate::types::Edition;

/// Flags accepted by `init` (and by `bake`, which initializes on demand).
///
/// Identity flags are required only when no project exists yet.
#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    pub project: Option<String>,
    pub provider: Option<String>,
    pub region: Option<String>,
    pub branch: Option<String>,
    pub domain: Option<String>,
    pub edition: Option<Edition>,
    pub options: ProviderOptions,
    /// Break an existing run lock.
    pub break_lock: bool,
}

impl InitArgs {
    pub fn new(project: &str, provider: &str, region: &str) -> Self {
        Self {
            project: Some(project.to_string()),
            provider: Some(provider.to_string()),
            region: Some(region.to_string()),
            ..Default::default()
        }
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }
}

/// Initialize the project in the workspace.
pub async fn init(ctx: &mut CommandContext, args: InitArgs) -> Result<ProjectState> {
    ctx.output.start_timer();
    let mut diag = Diagnostics::default();
    let lock = ctx.lock(args.project.as_deref(), args.break_lock)?;

    let result = initialize(ctx, &args).await;

    ctx.release(lock, &mut diag);
    ctx.report(&diag);

    let (state, _provider) = result?;
    Ok(state)
}

/// Load or create the project and bring it to `InitDone`.
///
/// Re-running on an initialized project refreshes its configuration files
/// without touching the cloud. The caller holds the run lock.
pub(super) async fn initialize(
    ctx: &CommandContext,
    args: &InitArgs,
) -> Result<(ProjectState, Box<dyn Provider>)> {
    let mut state = load_or_create(ctx, args)?;
    let provider = ctx.provider(&state.provider)?;

    if let Some(branch) = &args.branch {
        ensure_branch_switchable(&state, branch)?;
        state.branch = branch.clone();
    }
    if let Some(edition) = args.edition {
        state.edition = edition;
    }
    if let Some(domain) = &args.domain {
        state.set_domain(domain)?;
    }
    provider.configure(&mut state, &args.options)?;
    provider.validate_configuration(&state)?;

    let templates = provider.templates(&state);

    if state.status >= Status::InitDone {
        state.save()?;
        template::render_all(&templates, &state)?;
        ctx.output.success(&format!(
            "Project {} already initialized ({})",
            state.name,
            state.status.describe()
        ));
        return Ok((state, provider));
    }

    ctx.output.progress(&format!(
        "Initializing {} on {} ({})",
        state.name, state.provider, state.region
    ));
    state.advance(Status::InitRunning)?;

    for paths in state.layout().checkouts() {
        ctx.output
            .progress(&format!("  → Checking out {}...", paths.repository));
        source::checkout(
            ctx.runner.as_ref(),
            &ctx.settings.repositories.organization,
            &paths.repository,
            &paths.checkout,
            &state.branch,
            ctx.settings.timeouts.command,
        )
        .await?;
    }

    ctx.output.progress("  → Rendering configuration files...");
    template::render_all(&templates, &state)?;

    ctx.output
        .progress(&format!("  → Creating {} state store...", state.provider));
    provider.init_provider(&state).await?;

    state.advance(Status::InitDone)?;
    ctx.output
        .success(&format!("Project {} initialized", state.name));
    Ok((state, provider))
}

fn load_or_create(ctx: &CommandContext, args: &InitArgs) -> Result<ProjectState> {
    match ProjectState::load_from_storage(&ctx.root) {
        Ok(state) => {
            ensure_matches("project", args.project.as_deref(), state.name.as_str())?;
            ensure_matches("provider", args.provider.as_deref(), &state.provider)?;
            ensure_matches("region", args.region.as_deref(), &state.region)?;
            Ok(state)
        }
        Err(e) if e.is_not_found() => {
            let project = require_flag(args.project.as_deref(), "--project")?;
            let provider = require_flag(args.provider.as_deref(), "--provider")?;
            let region = require_flag(args.region.as_deref(), "--region")?;
            ProjectState::create_from_scratch(&ctx.root, project, provider, region)
        }
        Err(e) => Err(e),
    }
}

/// Existing checkouts are reused as-is, so their branch is fixed until clean.
fn ensure_branch_switchable(state: &ProjectState, branch: &str) -> Result<()> {
    if branch == state.branch {
        return Ok(());
    }
    let checked_out = state
        .layout()
        .checkouts()
        .iter()
        .any(|paths| paths.checkout.join(".git").exists());
    if checked_out {
        return Err(Error::validation(format!(
            "layer repositories are checked out at branch '{}'; run clean before switching to '{branch}'",
            state.branch
        )));
    }
    Ok(())
}

fn require_flag<'a>(value: Option<&'a str>, flag: &str) -> Result<&'a str> {
    value.ok_or_else(|| Error::validation(format!("{flag} is required to create a project")))
}

/// An identity flag may repeat the stored value but never change it.
fn ensure_matches(what: &str, requested: Option<&str>, stored: &str) -> Result<()> {
    match requested {
        Some(requested) if !requested.trim().eq_ignore_ascii_case(stored) => {
            Err(Error::validation(format!(
                "workspace already holds a project with {what} '{stored}'; run clean before using '{requested}'"
            )))
        }
        _ => Ok(()),
    }
}
