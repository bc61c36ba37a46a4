// ABOUTME: Error types for template rendering.
// ABOUTME: Distinguishes template syntax/undefined-variable errors from I/O failures.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to render template {name}: {source}")]
    Render {
        name: String,
        source: minijinja::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
