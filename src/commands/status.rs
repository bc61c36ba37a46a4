// ABOUTME: Status command: print the project's identity, checkpoint and service versions.

use super::CommandContext;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::Result;
use crate::lifecycle::StatusReport;
use crate::state::ProjectState;

/// Report on the project in the workspace. Returns `None` when there is none.
pub async fn status(ctx: &CommandContext) -> Result<Option<StatusReport>> {
    if !ProjectState::exists(&ctx.root) {
        ctx.output.success(&format!(
            "No project in {}; run init to create one",
            ctx.root.display()
        ));
        return Ok(None);
    }

    let state = ProjectState::load_from_storage(&ctx.root)?;
    let provider = ctx.provider(&state.provider)?;
    let report = provider.status(&state).await;

    let output = &ctx.output;
    output.detail("project", &report.name);
    output.detail("provider", &format!("{} ({})", report.provider, report.region));
    output.detail("edition", report.edition.as_str());
    output.detail(
        "status",
        &format!("{} ({})", report.status, report.status.describe()),
    );

    if let Some(endpoints) = &report.endpoints {
        output.detail("vault", &endpoints.vault);
        output.detail("consul", &endpoints.consul);
        output.detail("nomad", &endpoints.nomad);
    }

    let mut diag = Diagnostics::default();
    if let Some(versions) = &report.versions {
        output.detail(
            "versions",
            &format!(
                "vault {}, consul {}, nomad {}",
                versions.vault, versions.consul, versions.nomad
            ),
        );
        for service in versions.unavailable() {
            diag.warn(Warning::version_unavailable(format!(
                "could not read the {service} version"
            )));
        }
    }
    ctx.report(&diag);

    Ok(Some(report))
}
