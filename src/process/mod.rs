// ABOUTME: External process execution behind a mockable runner seam.
// ABOUTME: Terraform, cloud CLIs and git all go through CommandRunner.

mod error;
mod runner;
mod spec;

pub use error::{FailedSnafu, SpawnSnafu, TimedOutSnafu, ToolError};
pub use runner::{CommandRunner, SystemRunner};
pub use spec::{CommandOutput, CommandSpec};
