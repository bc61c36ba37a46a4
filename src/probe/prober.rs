// ABOUTME: Fixed-budget HTTPS health polling against cluster endpoints.
// ABOUTME: Only HTTP 200 counts as healthy; no backoff, no jitter.

use std::path::Path;
use std::time::Duration;

use super::{ProbeError, ProbeTarget, VERSION_ERROR, VERSION_NOT_FOUND, VersionSource};

/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause between failed attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(6);

/// Polls HTTPS endpoints until they answer 200.
#[derive(Debug, Clone)]
pub struct HealthProber {
    request_timeout: Duration,
}

impl Default for HealthProber {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

impl HealthProber {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }

    /// Build a client that trusts `ca_bundle` in addition to the system roots.
    pub fn client(&self, ca_bundle: Option<&Path>) -> Result<reqwest::Client, ProbeError> {
        let mut builder = reqwest::Client::builder().timeout(self.request_timeout);

        if let Some(path) = ca_bundle {
            let pem = std::fs::read(path).map_err(|source| ProbeError::CaBundleRead {
                path: path.to_path_buf(),
                source,
            })?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|source| {
                ProbeError::CaBundleInvalid {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        builder.build().map_err(ProbeError::Client)
    }

    /// Issue a single GET. True only for HTTP 200.
    pub async fn check(&self, client: &reqwest::Client, url: &str) -> bool {
        match client.get(url).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => true,
            Ok(response) => {
                tracing::debug!(url, status = response.status().as_u16(), "probe not ready");
                false
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "probe request failed");
                false
            }
        }
    }

    /// Probe `target` until it answers 200.
    ///
    /// Makes one initial attempt plus up to `attempts` retries, sleeping
    /// `interval` after each failure. Blocks the calling task throughout.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Timeout` naming the target once every attempt
    /// failed, or a client error if the CA bundle cannot be loaded.
    pub async fn poll(
        &self,
        target: &ProbeTarget,
        ca_bundle: Option<&Path>,
        attempts: u32,
        interval: Duration,
    ) -> Result<(), ProbeError> {
        let client = self.client(ca_bundle)?;

        for attempt in 0..=attempts {
            if self.check(&client, &target.url).await {
                tracing::info!(service = %target.name, url = %target.url, "endpoint healthy");
                return Ok(());
            }

            if attempt < attempts {
                tracing::debug!(
                    service = %target.name,
                    attempt = attempt + 1,
                    remaining = attempts - attempt,
                    "endpoint not healthy yet, retrying"
                );
                tokio::time::sleep(interval).await;
            }
        }

        Err(ProbeError::Timeout {
            target: format!("{} ({})", target.name, target.url),
            attempts: attempts + 1,
        })
    }

    /// Read a version string from `url`.
    ///
    /// Never fails: network problems yield [`VERSION_ERROR`], an unexpected
    /// body yields [`VERSION_NOT_FOUND`].
    pub async fn version(
        &self,
        url: &str,
        ca_bundle: Option<&Path>,
        source: &VersionSource,
        header: Option<(&str, &str)>,
    ) -> String {
        let client = match self.client(ca_bundle) {
            Ok(client) => client,
            Err(e) => {
                tracing::debug!(url, error = %e, "version client unavailable");
                return VERSION_ERROR.to_string();
            }
        };

        let mut request = client.get(url);
        if let Some((name, value)) = header {
            request = request.header(name, value);
        }

        let body = match request.send().await {
            Ok(response) if response.status().is_success() => response.text().await,
            Ok(response) => {
                tracing::debug!(url, status = response.status().as_u16(), "version request rejected");
                return VERSION_ERROR.to_string();
            }
            Err(e) => Err(e),
        };

        match body {
            Ok(body) => source
                .extract(&body)
                .unwrap_or_else(|| VERSION_NOT_FOUND.to_string()),
            Err(e) => {
                tracing::debug!(url, error = %e, "version request failed");
                VERSION_ERROR.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ca_bundle_is_reported() {
        let prober = HealthProber::default();
        let err = prober
            .client(Some(Path::new("/nonexistent/ca.pem")))
            .unwrap_err();
        assert!(matches!(err, ProbeError::CaBundleRead { .. }));
    }

    #[tokio::test]
    async fn unreachable_endpoint_times_out_with_target_name() {
        let prober = HealthProber::new(Duration::from_millis(200));
        let target = ProbeTarget::new("vault", "http://127.0.0.1:9/v1/sys/health");
        let err = prober
            .poll(&target, None, 1, Duration::from_millis(10))
            .await
            .unwrap_err();

        match err {
            ProbeError::Timeout { target, attempts } => {
                assert!(target.contains("vault"));
                assert_eq!(attempts, 2);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_version_is_error_sentinel() {
        let prober = HealthProber::new(Duration::from_millis(200));
        let version = prober
            .version(
                "http://127.0.0.1:9/v1/sys/health",
                None,
                &VersionSource::json("/version"),
                None,
            )
            .await;
        assert_eq!(version, VERSION_ERROR);
    }
}
