// ABOUTME: Shallow checkouts of the layer repositories.
// ABOUTME: An existing checkout is reused as-is so re-running init is cheap.

use std::path::Path;
use std::time::Duration;

use crate::process::{CommandRunner, CommandSpec, ToolError};

pub const GITHUB_BASE: &str = "https://github.com";

/// Clone URL of `repository` under `organization`.
pub fn repository_url(organization: &str, repository: &str) -> String {
    format!("{GITHUB_BASE}/{organization}/{repository}.git")
}

/// Clone `repository` at `branch` into `dest` unless a checkout is already there.
///
/// Returns whether a clone was performed.
pub async fn checkout(
    runner: &dyn CommandRunner,
    organization: &str,
    repository: &str,
    dest: &Path,
    branch: &str,
    timeout: Duration,
) -> Result<bool, ToolError> {
    if dest.join(".git").exists() {
        tracing::debug!(repository, dest = %dest.display(), "checkout already present");
        return Ok(false);
    }

    let spec = CommandSpec::new("git")
        .args(["clone", "--depth", "1", "--branch", branch])
        .arg(repository_url(organization, repository))
        .arg(dest.display().to_string())
        .timeout(timeout);
    runner.run_checked(&spec).await?;

    tracing::info!(repository, branch, dest = %dest.display(), "checked out repository");
    Ok(true)
}
