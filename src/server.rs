//! Logging setup and server startup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use bootstrapper_api::{ApiConfig, ApiServer, AppState};
use bootstrapper_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use bootstrapper_workflow::WorkflowEngine;

use crate::components::{build_catalog, build_engine, build_repositories};

/// Initialize tracing with console output, plus a daily log file when
/// `logging.log_dir` is set.
///
/// `RUST_LOG` takes precedence over `logging.level`.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = match &logging.log_dir {
        Some(dir) => {
            let log_dir = PathBuf::from(ConfigLoader::expand_path(dir));
            std::fs::create_dir_all(&log_dir)?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("bootstrapper")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&log_dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The worker flushes until the guard drops.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    Ok(())
}

/// Check the configuration, logging warnings. Errors abort startup.
pub(crate) fn check_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if !result.is_valid() {
        for err in &result.errors {
            error!("Config {}: {}", err.path, err.message);
        }
        return Err(format!("{} configuration error(s)", result.errors.len()).into());
    }
    Ok(())
}

/// Run the API server in foreground.
pub(crate) async fn run_server(
    config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting bootstrapper v{}", env!("CARGO_PKG_VERSION"));
    check_config(&config)?;

    let root = config.templates.root_path();
    tokio::fs::create_dir_all(&root).await?;
    info!("Templates root: {}", root.display());

    let catalog = build_catalog(&config);
    match catalog.snapshot().await {
        Ok(index) => info!("Template catalog ready with {} templates", index.len()),
        Err(e) => warn!("Template catalog could not be built yet: {}", e),
    }

    let engine = build_engine(&config, Arc::clone(&catalog))?;
    spawn_session_sweeper(Arc::clone(&engine));
    let repositories = build_repositories(&config, catalog)?;
    let state = Arc::new(AppState::new(engine, repositories));

    let api_config = ApiConfig::new(
        host.unwrap_or(config.server.host),
        port.unwrap_or(config.server.port),
    );
    info!(
        "Package generation service: {}:{}",
        config.gateway.bootstrapper.host, config.gateway.bootstrapper.port
    );

    ApiServer::new(api_config, state).run().await
}

/// Drop idle wizard sessions once a minute.
fn spawn_session_sweeper(engine: Arc<WorkflowEngine>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            engine.expire_idle_sessions();
        }
    });
}
