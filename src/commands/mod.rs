// ABOUTME: The user-visible operations: init, bake, up, clean and status.
// ABOUTME: Each takes an explicit CommandContext built once at the CLI boundary.

mod bake;
mod clean;
mod init;
mod status;
mod up;

pub use bake::bake;
pub use clean::clean;
pub use init::{InitArgs, init};
pub use status::status;
pub use up::up;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::Result;
use crate::lifecycle::LifecycleDriver;
use crate::output::Output;
use crate::probe::Endpoints;
use crate::process::{CommandRunner, SystemRunner};
use crate::provider::{Provider, ProviderRegistry, ProviderTools};
use crate::state::RunLock;

/// Everything a command needs, passed by parameter instead of global state.
pub struct CommandContext {
    /// Workspace directory holding `.caravan/`.
    pub root: PathBuf,
    pub settings: Settings,
    pub output: Output,
    pub runner: Arc<dyn CommandRunner>,
    /// Fixed service endpoints; derived from the project domain when unset.
    pub endpoints: Option<Endpoints>,
    pub registry: ProviderRegistry,
}

impl CommandContext {
    pub fn new(root: impl Into<PathBuf>, settings: Settings, output: Output) -> Self {
        Self {
            root: root.into(),
            settings,
            output,
            runner: Arc::new(SystemRunner),
            endpoints: None,
            registry: ProviderRegistry::default(),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Construct the provider registered under `tag`.
    pub fn provider(&self, tag: &str) -> Result<Box<dyn Provider>> {
        let driver = LifecycleDriver::new(self.runner.clone(), &self.settings)
            .with_endpoints(self.endpoints.clone());
        self.registry.build(
            tag,
            ProviderTools {
                driver,
                runner: self.runner.clone(),
                command_timeout: self.settings.timeouts.command,
            },
        )
    }

    fn lock(&self, project: Option<&str>, break_lock: bool) -> Result<RunLock> {
        RunLock::acquire(&self.root, project, break_lock)
    }

    /// Release the run lock, recording a failure as a warning.
    fn release(&self, lock: RunLock, diag: &mut Diagnostics) {
        if let Err(e) = lock.release() {
            diag.warn(Warning::lock_release(format!(
                "failed to release run lock: {e}"
            )));
        }
    }

    /// Print collected warnings.
    fn report(&self, diag: &Diagnostics) {
        for warning in diag.warnings() {
            self.output.warning(&warning.message);
        }
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("root", &self.root)
            .field("settings", &self.settings)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}
