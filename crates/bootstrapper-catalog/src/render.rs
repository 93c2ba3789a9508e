//! Template rendering seam.

use std::collections::BTreeMap;

use minijinja::Environment;

use crate::error::CatalogError;

/// Renders template source text against a flat string context.
pub trait Renderer: Send + Sync {
    fn render(&self, source: &str, context: &BTreeMap<String, String>)
    -> Result<String, CatalogError>;
}

/// Jinja-compatible renderer.
///
/// Undefined variables render as empty strings.
pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }
}

impl Default for JinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for JinjaRenderer {
    fn render(
        &self,
        source: &str,
        context: &BTreeMap<String, String>,
    ) -> Result<String, CatalogError> {
        self.env
            .render_str(source, context)
            .map_err(|e| CatalogError::Render(e.to_string()))
    }
}
