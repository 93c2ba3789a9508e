//! Component wiring shared by the server and the CLI commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use bootstrapper_catalog::{
    GitCli, JinjaRenderer, RepositoryError, RepositoryManager, TemplateCatalog, TemplateLoader,
    UrlResolver,
};
use bootstrapper_config::Config;
use bootstrapper_gateway::{GatewayError, PanoramaClient, ServiceEndpoint, ServiceGateway};
use bootstrapper_workflow::{EngineSettings, WorkflowEngine};

/// Catalog sources in lookup order: built-in directories, then the templates root.
pub(crate) fn catalog_sources(config: &Config) -> Vec<PathBuf> {
    let mut sources = config.templates.builtin_paths();
    sources.push(config.templates.root_path());
    sources
}

pub(crate) fn build_catalog(config: &Config) -> Arc<TemplateCatalog> {
    let sources = catalog_sources(config);
    debug!("Template sources: {:?}", sources);
    Arc::new(TemplateCatalog::new(
        sources,
        TemplateLoader::new(config.templates.max_depth),
    ))
}

pub(crate) fn build_repositories(
    config: &Config,
    catalog: Arc<TemplateCatalog>,
) -> Result<Arc<RepositoryManager>, RepositoryError> {
    let timeout = Duration::from_secs(config.templates.git_timeout_seconds);
    Ok(Arc::new(RepositoryManager::new(
        config.templates.root_path(),
        catalog,
        Arc::new(GitCli::new(timeout)),
        UrlResolver::new(config.templates.github_api.clone(), Duration::from_secs(10))?,
    )))
}

pub(crate) fn build_engine(
    config: &Config,
    catalog: Arc<TemplateCatalog>,
) -> Result<Arc<WorkflowEngine>, GatewayError> {
    let gateway = ServiceGateway::new(
        ServiceEndpoint::new(
            config.gateway.bootstrapper.host.clone(),
            config.gateway.bootstrapper.port,
        ),
        ServiceEndpoint::new(
            config.gateway.content_downloader.host.clone(),
            config.gateway.content_downloader.port,
        ),
        Duration::from_secs(config.gateway.timeout_seconds),
    )?;
    let panorama = PanoramaClient::new(
        config.panorama.scheme.clone(),
        config.panorama.verify_tls,
        Duration::from_secs(config.panorama.timeout_seconds),
    )?;

    Ok(Arc::new(WorkflowEngine::new(
        catalog,
        Arc::new(JinjaRenderer::new()),
        Arc::new(gateway),
        Arc::new(panorama),
        EngineSettings {
            auth_key_lifetime_hours: config.panorama.auth_key_lifetime_hours,
            session_idle_timeout: Duration::from_secs(config.server.session_idle_minutes * 60),
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootstrapper_workflow::WorkflowStore;

    #[test]
    fn test_catalog_sources_order() {
        let mut config = Config::default();
        config.templates.builtin_dirs = vec!["templates".to_string()];
        config.templates.root = "/srv/bootstrapper/templates".to_string();

        assert_eq!(
            catalog_sources(&config),
            vec![
                PathBuf::from("templates"),
                PathBuf::from("/srv/bootstrapper/templates")
            ]
        );
    }

    fn shipped_templates_config() -> Config {
        let templates = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");
        let mut config = Config::default();
        config.templates.builtin_dirs = vec![templates.to_string()];
        config.templates.root = format!("{}/imported-not-present", templates);
        config
    }

    #[tokio::test]
    async fn test_shipped_templates_load() {
        let catalog = build_catalog(&shipped_templates_config());
        let index = catalog.snapshot().await.unwrap();

        for name in ["bootstrap_xml", "init_cfg", "content_downloader"] {
            assert!(index.get(name).is_some(), "missing built-in template {}", name);
        }
        assert_eq!(
            index
                .with_label("template_category", "panos_full")
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>(),
            vec!["bootstrap_xml"]
        );
    }

    #[tokio::test]
    async fn test_shipped_init_cfg_renders() {
        let config = shipped_templates_config();
        let engine = build_engine(&config, build_catalog(&config)).unwrap();

        let mut store = WorkflowStore::new("bootstrapper");
        store.set("hostname", "fw01");
        store.set("network_type", "static");
        store.set("ip_address", "10.0.0.5");
        store.set("netmask", "255.255.255.0");
        store.set("default_gateway", "10.0.0.1");
        store.set("TARGET_IP", "10.0.0.200");

        let text = engine.compiler().init_config_text(&store).await.unwrap();
        assert!(text.starts_with("type=static"));
        assert!(text.contains("ip-address=10.0.0.5"));
        assert!(text.contains("hostname=fw01"));
        assert!(text.contains("panorama-server=10.0.0.200"));
        assert!(!text.contains("vm-auth-key"));
    }

    #[tokio::test]
    async fn test_build_engine() {
        let config = Config::default();
        let catalog = build_catalog(&config);
        let engine = build_engine(&config, Arc::clone(&catalog)).unwrap();
        assert_eq!(engine.entry(), "start");
        assert!(engine.step("complete").unwrap().is_terminal());
    }

    #[tokio::test]
    async fn test_build_repositories() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.templates.root = dir.path().display().to_string();

        let repositories = build_repositories(&config, build_catalog(&config)).unwrap();
        assert_eq!(repositories.root(), dir.path());
        assert!(repositories.list().await.unwrap().is_empty());
    }
}
