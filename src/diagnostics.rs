// ABOUTME: Diagnostics accumulator for non-fatal warnings during a lifecycle command.
// ABOUTME: Collects failures that must not stop teardown but should be shown to users.

/// Collects non-fatal warnings during lifecycle operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind.
    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// A non-fatal warning collected during a command.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A layer destroy failed and was suppressed.
    pub fn destroy_failed(message: impl Into<String>) -> Self {
        Self::new(WarningKind::DestroyFailed, message)
    }

    /// Removing the state store or lock failed under `--force`.
    pub fn provider_clean_failed(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ProviderCleanFailed, message)
    }

    /// Create a lock release warning.
    pub fn lock_release(message: impl Into<String>) -> Self {
        Self::new(WarningKind::LockRelease, message)
    }

    /// A service version could not be read.
    pub fn version_unavailable(message: impl Into<String>) -> Self {
        Self::new(WarningKind::VersionUnavailable, message)
    }
}

/// Categories of warnings that can occur during a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Destroying a layer failed; cloud resources may have leaked.
    DestroyFailed,
    /// Removing provider baseline resources failed.
    ProviderCleanFailed,
    /// Failed to release the run lock (lock file may remain).
    LockRelease,
    /// Version discovery returned a sentinel.
    VersionUnavailable,
}
