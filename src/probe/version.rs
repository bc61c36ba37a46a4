// ABOUTME: Extraction of service version strings from HTTP response bodies.
// ABOUTME: Supports JSON pointers and regex markers embedded in HTML.

use regex::Regex;
use std::sync::LazyLock;

/// Returned when the endpoint could not be reached.
pub const VERSION_ERROR: &str = "error";

/// Returned when the endpoint answered but carried no recognizable version.
pub const VERSION_NOT_FOUND: &str = "not found";

static CONSUL_UI_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"CONSUL_VERSION:\s*"?([0-9][0-9A-Za-z.+\-]*)"#)
        .expect("consul version marker pattern is a valid literal")
});

#[derive(Debug, Clone)]
pub enum VersionSource {
    /// A string at a JSON pointer, e.g. `/version`.
    Json(String),
    /// The first capture group of a pattern matched against the raw body.
    Marker(Regex),
}

impl VersionSource {
    pub fn json(pointer: impl Into<String>) -> Self {
        VersionSource::Json(pointer.into())
    }

    /// Version embedded in the mesh UI page as `CONSUL_VERSION: <version>`.
    pub fn consul_ui_marker() -> Self {
        VersionSource::Marker(CONSUL_UI_MARKER.clone())
    }

    pub fn extract(&self, body: &str) -> Option<String> {
        match self {
            VersionSource::Json(pointer) => {
                let value: serde_json::Value = serde_json::from_str(body).ok()?;
                value
                    .pointer(pointer)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            }
            VersionSource::Marker(regex) => regex
                .captures(body)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string()),
        }
    }
}
