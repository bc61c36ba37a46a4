// ABOUTME: Test support utilities.
// ABOUTME: Provides a recording CommandRunner, fast settings and project fixtures.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::{Arc, Once};
use std::time::Duration;

use caravan::commands::CommandContext;
use caravan::config::{ProbeConfig, Settings};
use caravan::lifecycle::LifecycleDriver;
use caravan::output::{Output, OutputMode};
use caravan::probe::Endpoints;
use caravan::process::{CommandOutput, CommandRunner, CommandSpec, ToolError};
use caravan::provider::{Provider, ProviderOptions, ProviderRegistry, ProviderTools};
use caravan::state::{ProjectState, Status};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("caravan=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

struct Rule {
    program: String,
    arg: String,
    output: CommandOutput,
}

/// A CommandRunner that records every command and succeeds unless a rule says otherwise.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    rules: Mutex<Vec<Rule>>,
}

#[allow(dead_code)]
impl RecordingRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every `program` call whose arguments include `arg` exit 1 with `stderr`.
    pub fn fail_when(&self, program: &str, arg: &str, stderr: &str) {
        self.rules.lock().push(Rule {
            program: program.to_string(),
            arg: arg.to_string(),
            output: CommandOutput::failure(1, stderr),
        });
    }

    pub fn clear_rules(&self) {
        self.rules.lock().clear();
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.program == program)
            .cloned()
            .collect()
    }

    /// Terraform subcommands in call order, e.g. `["init", "apply"]`.
    pub fn terraform_subcommands(&self) -> Vec<String> {
        self.calls_to("terraform")
            .into_iter()
            .filter_map(|c| c.args.first().cloned())
            .collect()
    }

    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError> {
        self.calls.lock().push(spec.clone());

        let rules = self.rules.lock();
        let output = rules
            .iter()
            .find(|r| r.program == spec.program && spec.has_arg(&r.arg))
            .map(|r| r.output.clone())
            .unwrap_or_else(CommandOutput::success);
        Ok(output)
    }
}

/// Settings with a tiny probe budget so failing gates finish quickly.
#[allow(dead_code)]
pub fn fast_settings() -> Settings {
    Settings {
        probe: ProbeConfig {
            attempts: 2,
            interval: Duration::from_millis(10),
            timeout: Duration::from_secs(2),
        },
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn context(root: &Path, runner: Arc<RecordingRunner>) -> CommandContext {
    CommandContext::new(root, fast_settings(), Output::new(OutputMode::Quiet)).with_runner(runner)
}

#[allow(dead_code)]
pub fn context_with_endpoints(
    root: &Path,
    runner: Arc<RecordingRunner>,
    base: &str,
) -> CommandContext {
    context(root, runner).with_endpoints(Endpoints::single(base))
}

#[allow(dead_code)]
pub fn driver(runner: Arc<RecordingRunner>) -> LifecycleDriver {
    LifecycleDriver::new(runner, &fast_settings())
}

#[allow(dead_code)]
pub fn aws_provider(runner: Arc<RecordingRunner>) -> Box<dyn Provider> {
    let tools = ProviderTools {
        driver: driver(runner.clone()),
        runner,
        command_timeout: Duration::from_secs(5),
    };
    ProviderRegistry::default()
        .build("aws", tools)
        .expect("aws is registered")
}

/// A demo/aws/eu-south-1 project persisted at `status`.
#[allow(dead_code)]
pub fn aws_project(root: &Path, status: Status) -> ProjectState {
    let mut state = ProjectState::create_from_scratch(root, "demo", "aws", "eu-south-1").unwrap();
    state.set_domain("example.com").unwrap();
    aws_provider(RecordingRunner::new())
        .configure(&mut state, &ProviderOptions::default())
        .unwrap();
    state.save().unwrap();
    if status != Status::InitMissing {
        state.advance(status).unwrap();
    }
    state
}

/// Write the root token the infrastructure layer would have produced.
#[allow(dead_code)]
pub fn write_root_token(state: &ProjectState, token: &str) {
    let path = &state.layout().root_token_file;
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, format!("{token}\n")).unwrap();
}
