// ABOUTME: CommandRunner trait and the tokio-backed implementation.
// ABOUTME: Each invocation is bounded by the timeout carried in its CommandSpec.

use async_trait::async_trait;
use snafu::ResultExt;
use std::process::Stdio;
use tokio::process::Command;

use super::{CommandOutput, CommandSpec, SpawnSnafu, TimedOutSnafu, ToolError};

/// Runs external commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and capture its output.
    ///
    /// A non-zero exit is not an error at this level; callers decide.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError>;

    /// Run a command and fail on a non-zero exit.
    async fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError> {
        self.run(spec).await?.ensure_success(spec)
    }
}

/// Runs commands as local child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError> {
        tracing::debug!(
            command = %spec,
            dir = ?spec.dir,
            timeout_secs = spec.timeout.as_secs(),
            "running external command"
        );

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.dir {
            command.current_dir(dir);
        }

        let child = command.spawn().context(SpawnSnafu {
            program: spec.program.clone(),
        })?;

        // Dropping the wait future on timeout kills the child.
        let output = match tokio::time::timeout(spec.timeout, child.wait_with_output()).await {
            Ok(result) => result.context(SpawnSnafu {
                program: spec.program.clone(),
            })?,
            Err(_elapsed) => {
                return TimedOutSnafu {
                    command: spec.to_string(),
                    timeout: spec.timeout,
                }
                .fail();
            }
        };

        let output = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if output.is_success() {
            tracing::debug!(command = %spec, "external command completed");
        } else {
            tracing::debug!(
                command = %spec,
                code = ?output.code,
                "external command failed"
            );
        }

        Ok(output)
    }
}
