// ABOUTME: HTTPS health probing and best-effort version discovery.
// ABOUTME: Used as gates between deploy layers and by the status report.

mod endpoints;
mod error;
mod prober;
mod version;

pub use endpoints::{Endpoints, ProbeTarget};
pub use error::ProbeError;
pub use prober::{DEFAULT_INTERVAL, DEFAULT_REQUEST_TIMEOUT, HealthProber};
pub use version::{VERSION_ERROR, VERSION_NOT_FOUND, VersionSource};
