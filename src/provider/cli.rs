// ABOUTME: Helpers for idempotent cloud CLI calls.
// ABOUTME: "Already exists" on create and "not found" on delete count as success.

use crate::process::{CommandRunner, CommandSpec, ToolError};

const ALREADY_EXISTS: &[&str] = &[
    "already exists",
    "alreadyexists",
    "already_exists",
    "bucketalreadyownedbyyou",
    "resourceinuseexception",
    "already owned by you",
];

const NOT_FOUND: &[&str] = &[
    "not found",
    "notfound",
    "not_found",
    "nosuchbucket",
    "resourcenotfoundexception",
    "does not exist",
    "was not found",
];

fn stderr_matches(stderr: &str, needles: &[&str]) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    needles.iter().any(|n| stderr.contains(n))
}

/// Run a create command, accepting an existing resource.
pub async fn create(runner: &dyn CommandRunner, spec: CommandSpec) -> Result<(), ToolError> {
    let output = runner.run(&spec).await?;
    if !output.is_success() && stderr_matches(&output.stderr, ALREADY_EXISTS) {
        tracing::debug!(command = %spec, "resource already exists");
        return Ok(());
    }
    output.ensure_success(&spec)?;
    Ok(())
}

/// Run a delete command, accepting a resource that is already gone.
pub async fn remove(runner: &dyn CommandRunner, spec: CommandSpec) -> Result<(), ToolError> {
    let output = runner.run(&spec).await?;
    if !output.is_success() && stderr_matches(&output.stderr, NOT_FOUND) {
        tracing::debug!(command = %spec, "resource already removed");
        return Ok(());
    }
    output.ensure_success(&spec)?;
    Ok(())
}
