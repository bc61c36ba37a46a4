// ABOUTME: Error types for health probes and HTTP requests to cluster services.
// ABOUTME: Timeout names the target that never became healthy.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The target never answered 200 within the retry budget.
    #[error("{target} did not become healthy after {attempts} attempts")]
    Timeout { target: String, attempts: u32 },

    #[error("failed to read CA bundle {}: {source}", path.display())]
    CaBundleRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid CA bundle {}: {source}", path.display())]
    CaBundleInvalid {
        path: PathBuf,
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("unexpected response from {url}: {reason}")]
    UnexpectedResponse { url: String, reason: String },
}
