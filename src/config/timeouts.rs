// ABOUTME: Timeouts for terraform runs, escalating with expected provisioning time.
// ABOUTME: Baking builds machine images and gets twice the budget of a layer apply.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_bake", with = "humantime_serde")]
    pub bake: Duration,

    /// Apply or destroy of one deploy layer.
    #[serde(default = "default_layer", with = "humantime_serde")]
    pub layer: Duration,

    /// Cloud CLI and git calls.
    #[serde(default = "default_command", with = "humantime_serde")]
    pub command: Duration,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            bake: default_bake(),
            layer: default_layer(),
            command: default_command(),
        }
    }
}

fn default_bake() -> Duration {
    Duration::from_secs(1200)
}

fn default_layer() -> Duration {
    Duration::from_secs(600)
}

fn default_command() -> Duration {
    Duration::from_secs(120)
}
