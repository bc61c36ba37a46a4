// ABOUTME: The generic lifecycle shared by every provider.
// ABOUTME: Layer deploy/destroy, health gates, secret acquisition and status reporting.

mod driver;
mod report;
pub mod secrets;

pub use driver::{LifecycleDriver, MESH_TARGET};
pub use report::{ServiceVersions, StatusReport};
