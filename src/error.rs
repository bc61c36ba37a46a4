// ABOUTME: Application-wide error types for caravan.
// ABOUTME: Uses thiserror for ergonomic error handling and classifies errors by kind.

use std::path::PathBuf;
use thiserror::Error;

use crate::probe::ProbeError;
use crate::process::ToolError;
use crate::state::Status;
use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("no caravan project found in {0}")]
    NotFound(PathBuf),

    #[error("project state at {} is corrupt: {source}", path.display())]
    CorruptState {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to persist project state to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },

    #[error("project is locked by {holder} (pid {pid}) since {since}")]
    Locked {
        holder: String,
        pid: u32,
        since: String,
    },

    #[error("failed to acquire cluster secrets: {0}")]
    Secret(String),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input or configuration. Never retried.
    Validation,
    /// Expected absence, such as no project state yet.
    NotFound,
    /// The persisted state file cannot be parsed.
    CorruptState,
    /// The persisted state file cannot be written.
    Persistence,
    /// A health probe exhausted its attempts.
    Timeout,
    /// An external tool failed or timed out.
    ExternalTool,
    /// No provider is registered under the requested tag.
    UnknownProvider,
    /// Anything else: templates, locks, secrets, local I/O.
    Other,
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::InvalidTransition { .. } => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::CorruptState { .. } => ErrorKind::CorruptState,
            Error::Persistence { .. } => ErrorKind::Persistence,
            Error::Probe(ProbeError::Timeout { .. }) => ErrorKind::Timeout,
            Error::Probe(_) => ErrorKind::Other,
            Error::Tool(_) => ErrorKind::ExternalTool,
            Error::UnknownProvider(_) => ErrorKind::UnknownProvider,
            Error::Locked { .. }
            | Error::Secret(_)
            | Error::Template(_)
            | Error::Io(_)
            | Error::Yaml(_) => ErrorKind::Other,
        }
    }

    /// Whether this error represents "no project yet" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(
            Error::validation("bad region").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::NotFound(PathBuf::from("/tmp")).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::UnknownProvider("openstack".to_string()).kind(),
            ErrorKind::UnknownProvider
        );
        let timeout = Error::Probe(ProbeError::Timeout {
            target: "vault".to_string(),
            attempts: 3,
        });
        assert_eq!(timeout.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn not_found_is_detectable() {
        assert!(Error::NotFound(PathBuf::from(".caravan")).is_not_found());
        assert!(!Error::validation("x").is_not_found());
    }

    #[test]
    fn invalid_transition_names_both_statuses() {
        let err = Error::InvalidTransition {
            from: Status::InfraDeployDone,
            to: Status::InitDone,
        };
        let msg = err.to_string();
        assert!(msg.contains("InfraDeployDone"));
        assert!(msg.contains("InitDone"));
    }
}
