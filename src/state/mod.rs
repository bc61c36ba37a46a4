// ABOUTME: Persisted project state and the lifecycle checkpoint machine.
// ABOUTME: Exports ProjectState, Status, DeployLayer, the derived Layout, and RunLock.

mod blocks;
mod layer;
mod layout;
mod lock;
mod project;
mod status;

pub use blocks::{AwsConfig, AzureConfig, GcpConfig};
pub use layer::DeployLayer;
pub use layout::{LOCK_FILE, LayerPaths, Layout, STATE_DIR, STATE_FILE};
pub use lock::{LockInfo, RunLock};
pub use project::{DEFAULT_BRANCH, ProjectState};
pub use status::Status;
