// ABOUTME: Configuration-file templates rendered from project state.
// ABOUTME: Rendering is pure; writing creates parent directories and fails loudly.

mod error;
mod layers;

pub use error::TemplateError;
pub use layers::{APPLICATION_VARS, PLATFORM_VARS, backend, layer_vars};

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use std::borrow::Cow;
use std::path::PathBuf;

use crate::state::{DeployLayer, Layout, ProjectState};

/// A named piece of template text and the file it renders to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub path: PathBuf,
    pub text: Cow<'static, str>,
    /// Layer exposed to the template as `layer`, if any.
    pub layer: Option<DeployLayer>,
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        text: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            text: text.into(),
            layer: None,
        }
    }

    pub fn for_layer(mut self, layer: DeployLayer) -> Self {
        self.layer = Some(layer);
        self
    }

    /// Render against `state` without touching the filesystem.
    pub fn render_to_string(&self, state: &ProjectState) -> Result<String, TemplateError> {
        let context = TemplateContext {
            state,
            paths: state.layout(),
            layer: self.layer.map(DeployLayer::as_str),
        };

        environment()
            .render_str(&self.text, &context)
            .map_err(|source| TemplateError::Render {
                name: self.name.clone(),
                source,
            })
    }

    /// Render against `state` and write the result to `self.path`.
    pub fn render(&self, state: &ProjectState) -> Result<(), TemplateError> {
        let content = self.render_to_string(state)?;

        let write_error = |source| TemplateError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(&self.path, content).map_err(write_error)?;

        tracing::debug!(template = %self.name, path = %self.path.display(), "rendered template");
        Ok(())
    }
}

/// Render every template in order, stopping at the first failure.
pub fn render_all(templates: &[Template], state: &ProjectState) -> Result<(), TemplateError> {
    templates.iter().try_for_each(|t| t.render(state))
}

#[derive(Serialize)]
struct TemplateContext<'a> {
    #[serde(flatten)]
    state: &'a ProjectState,
    paths: &'a Layout,
    #[serde(skip_serializing_if = "Option::is_none")]
    layer: Option<&'static str>,
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env
}
