// ABOUTME: Acquisition of the cluster secrets needed by the upper layers.
// ABOUTME: Root token comes from a file written by infrastructure; the scheduler token from vault.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::probe::{HealthProber, ProbeError};

/// Header carrying the secrets-manager token.
pub const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Read the secrets-manager root token written by the infrastructure layer.
pub fn read_root_token(path: &Path) -> Result<String> {
    let token = std::fs::read_to_string(path).map_err(|e| {
        Error::Secret(format!("cannot read root token file {}: {e}", path.display()))
    })?;

    let token = token.trim();
    if token.is_empty() {
        return Err(Error::Secret(format!(
            "root token file {} is empty",
            path.display()
        )));
    }
    Ok(token.to_string())
}

#[derive(Deserialize)]
struct CredsResponse {
    data: CredsData,
}

#[derive(Deserialize)]
struct CredsData {
    secret_id: String,
}

/// Request a scheduler management token from the secrets manager's
/// dynamic-credential endpoint at `url`.
pub async fn request_nomad_token(
    prober: &HealthProber,
    url: &str,
    ca_bundle: Option<&Path>,
    root_token: &str,
) -> Result<String> {
    let client = prober.client(ca_bundle)?;

    let response = client
        .get(url)
        .header(VAULT_TOKEN_HEADER, root_token)
        .send()
        .await
        .map_err(|source| ProbeError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProbeError::UnexpectedResponse {
            url: url.to_string(),
            reason: format!("HTTP {}", status.as_u16()),
        }
        .into());
    }

    let creds: CredsResponse = response.json().await.map_err(|source| ProbeError::Request {
        url: url.to_string(),
        source,
    })?;

    tracing::info!(url, "obtained scheduler token");
    Ok(creds.data.secret_id)
}
