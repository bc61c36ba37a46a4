// ABOUTME: Provider-specific configuration blocks stored with the project.
// ABOUTME: Only the active provider's block is populated and serialized.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Named profile from the local AWS credentials file.
    pub profile: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcpConfig {
    /// Project hosting the state bucket and the terraform service account.
    pub parent_project: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_account: Option<String>,

    /// Email of the service account terraform runs as.
    pub service_account: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureConfig {
    pub resource_group: String,
    pub subscription_id: String,
    pub tenant_id: String,
    /// Storage account holding the state container.
    pub storage_account: String,
}
