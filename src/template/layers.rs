// ABOUTME: Template text shared by every provider for the platform and application layers.
// ABOUTME: Providers contribute baking, infrastructure and backend text of their own.

use super::Template;
use crate::state::{DeployLayer, ProjectState};

pub const PLATFORM_VARS: &str = r#"vault_endpoint    = "https://vault.{{ domain }}"
consul_endpoint   = "https://consul.{{ domain }}"
nomad_endpoint    = "https://nomad.{{ domain }}"
ca_cert_file      = "{{ paths.ca_bundle }}"
prefix            = "{{ name }}"
edition           = "{{ edition }}"
auth_providers    = ["{{ provider }}"]
"#;

pub const APPLICATION_VARS: &str = r#"vault_endpoint    = "https://vault.{{ domain }}"
consul_endpoint   = "https://consul.{{ domain }}"
nomad_endpoint    = "https://nomad.{{ domain }}"
ca_cert_file      = "{{ paths.ca_bundle }}"
domain            = "{{ domain }}"
artifacts_source_prefix = ""
container_registry      = ""
"#;

/// Variable file template for `layer`.
pub fn layer_vars(
    state: &ProjectState,
    layer: DeployLayer,
    text: impl Into<std::borrow::Cow<'static, str>>,
) -> Template {
    let paths = state.layout().layer(layer);
    Template::new(
        format!("{layer} variables"),
        paths.var_file.clone(),
        text,
    )
    .for_layer(layer)
}

/// Backend file template for `layer`.
///
/// Every layer carries a backend file, so a missing path means the layout
/// was built for a different kind of checkout; fall back to the layer dir.
pub fn backend(
    state: &ProjectState,
    layer: DeployLayer,
    text: impl Into<std::borrow::Cow<'static, str>>,
) -> Template {
    let paths = state.layout().layer(layer);
    let path = paths
        .backend_file
        .clone()
        .unwrap_or_else(|| paths.dir.join("backend.tf"));
    Template::new(format!("{layer} backend"), path, text).for_layer(layer)
}
