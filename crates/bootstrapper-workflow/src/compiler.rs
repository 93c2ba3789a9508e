//! Payload compiler.
//!
//! Turns the accumulated answers into the configuration texts shipped in the
//! bootstrap package. Nothing produced here is persisted beyond the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use bootstrapper_catalog::{CatalogError, Renderer, TemplateCatalog};
use tracing::debug;

use crate::error::WorkflowError;
use crate::graph::{CHOICE_NONE, CHOICE_UPLOAD};
use crate::store::WorkflowStore;

/// Template rendered into `init-cfg.txt`.
pub const INIT_CFG_TEMPLATE: &str = "init_cfg";

/// Template rendered into the content service request.
pub const CONTENT_TEMPLATE: &str = "content_downloader";

/// The rendered configuration texts, before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub bootstrap_text: String,
    pub init_config_text: String,
}

pub struct PayloadCompiler {
    catalog: Arc<TemplateCatalog>,
    renderer: Arc<dyn Renderer>,
}

impl PayloadCompiler {
    pub fn new(catalog: Arc<TemplateCatalog>, renderer: Arc<dyn Renderer>) -> Self {
        Self { catalog, renderer }
    }

    /// Render the first file of `template_id` against the store.
    ///
    /// The context holds the template's variable defaults overlaid with
    /// store values, optionally restricted to `filter_keys`. `FW_NAME`
    /// always follows `hostname` when both are set.
    pub async fn render(
        &self,
        template_id: &str,
        store: &WorkflowStore,
        filter_keys: Option<&[&str]>,
    ) -> Result<String, WorkflowError> {
        let template = self
            .catalog
            .get(template_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(template_id.to_string()))?;

        let mut context: BTreeMap<String, String> = template
            .variables
            .iter()
            .filter(|v| filter_keys.is_none_or(|keys| keys.contains(&v.name.as_str())))
            .map(|v| (v.name.clone(), v.default.clone()))
            .collect();
        context.extend(store.context(filter_keys));
        align_firewall_name(&mut context);

        let source = template.read_file(None)?;
        debug!(
            "Rendering template '{}' with {} context keys",
            template_id,
            context.len()
        );
        Ok(self.renderer.render(&source, &context)?)
    }

    /// The bootstrap.xml text for the current template choice.
    pub async fn bootstrap_text(&self, store: &WorkflowStore) -> Result<String, WorkflowError> {
        match store.get_or("custom_bootstrap", CHOICE_NONE) {
            CHOICE_NONE | "" => Ok(String::new()),
            CHOICE_UPLOAD => Ok(store.get_or("bootstrap_upload", "").to_string()),
            template_id => self.render(template_id, store, None).await,
        }
    }

    /// The init-cfg.txt text.
    pub async fn init_config_text(&self, store: &WorkflowStore) -> Result<String, WorkflowError> {
        if !store.contains("panorama_ip") {
            if let Some(target) = store.get("TARGET_IP") {
                let mut store = store.clone();
                store.set("panorama_ip", target);
                return self.render(INIT_CFG_TEMPLATE, &store, None).await;
            }
        }
        self.render(INIT_CFG_TEMPLATE, store, None).await
    }

    pub async fn compile_artifacts(&self, store: &WorkflowStore) -> Result<Artifacts, WorkflowError> {
        Ok(Artifacts {
            bootstrap_text: self.bootstrap_text(store).await?,
            init_config_text: self.init_config_text(store).await?,
        })
    }
}

fn align_firewall_name(context: &mut BTreeMap<String, String>) {
    if let (Some(hostname), Some(fw_name)) = (context.get("hostname"), context.get("FW_NAME")) {
        if hostname != fw_name {
            let hostname = hostname.clone();
            context.insert("FW_NAME".to_string(), hostname);
        }
    }
}

/// URL-safe base64 with padding.
pub fn encode(text: &str) -> String {
    URL_SAFE.encode(text.as_bytes())
}

pub fn decode(encoded: &str) -> Result<String, WorkflowError> {
    let bytes = URL_SAFE
        .decode(encoded.as_bytes())
        .map_err(|e| WorkflowError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| WorkflowError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;
