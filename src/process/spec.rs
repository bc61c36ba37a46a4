// ABOUTME: Description of one external command and its captured result.
// ABOUTME: Display forms omit environment values because they carry secrets.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{FailedSnafu, ToolError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Lines of stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            env: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the argument list contains `needle` verbatim.
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a == needle)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into `ToolError::Failed`.
    pub fn ensure_success(self, spec: &CommandSpec) -> Result<Self, ToolError> {
        if self.is_success() {
            return Ok(self);
        }

        let status = match self.code {
            Some(code) => format!("exit code {code}"),
            None => "a signal".to_string(),
        };
        FailedSnafu {
            command: spec.to_string(),
            status,
            stderr: stderr_tail(&self.stderr),
        }
        .fail()
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_omits_environment() {
        let mut env = BTreeMap::new();
        env.insert("VAULT_TOKEN".to_string(), "s.secret".to_string());
        let spec = CommandSpec::new("terraform")
            .args(["apply", "-auto-approve"])
            .envs(&env);

        assert_eq!(spec.to_string(), "terraform apply -auto-approve");
        assert!(spec.has_arg("-auto-approve"));
        assert!(!spec.has_arg("apply -auto-approve"));
    }

    #[test]
    fn failed_output_becomes_error_with_stderr_tail() {
        let spec = CommandSpec::new("terraform").arg("apply");
        let stderr = (0..30).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let err = CommandOutput::failure(1, stderr)
            .ensure_success(&spec)
            .unwrap_err();

        let tail = err.stderr().unwrap();
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
        assert!(err.to_string().contains("exit code 1"));
    }

    #[test]
    fn successful_output_passes_through() {
        let spec = CommandSpec::new("git");
        assert!(CommandOutput::success().ensure_success(&spec).is_ok());
    }
}
