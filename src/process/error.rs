// ABOUTME: External tool error types with SNAFU pattern.
// ABOUTME: Covers spawn failures, non-zero exits and per-call timeouts.

use snafu::Snafu;
use std::time::Duration;

/// Failure of an external tool invocation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ToolError {
    #[snafu(display("failed to run {program}: {source}"))]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display("`{command}` exited with {status}: {stderr}"))]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[snafu(display("`{command}` timed out after {}s", timeout.as_secs()))]
    TimedOut { command: String, timeout: Duration },
}

impl ToolError {
    /// Captured stderr of a failed run, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ToolError::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}
