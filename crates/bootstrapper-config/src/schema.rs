//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub panorama: PanoramaConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Wizard sessions idle for longer than this are dropped.
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_idle_minutes: default_session_idle_minutes(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_session_idle_minutes() -> u64 {
    60
}

/// Template sources and repository management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory holding imported repositories and built-in collections.
    #[serde(default = "default_templates_root")]
    pub root: String,

    /// Extra built-in template directories scanned before `root`.
    #[serde(default = "default_builtin_dirs")]
    pub builtin_dirs: Vec<String>,

    /// Hosting-service API used to resolve short repository URLs.
    #[serde(default = "default_github_api")]
    pub github_api: String,

    #[serde(default = "default_git_timeout")]
    pub git_timeout_seconds: u64,

    /// Maximum directory depth searched for template metadata.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl TemplatesConfig {
    /// Templates root with `~` expanded.
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.root).to_string())
    }

    /// Built-in directories with `~` expanded.
    pub fn builtin_paths(&self) -> Vec<PathBuf> {
        self.builtin_dirs
            .iter()
            .map(|d| PathBuf::from(shellexpand::tilde(d).to_string()))
            .collect()
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            root: default_templates_root(),
            builtin_dirs: default_builtin_dirs(),
            github_api: default_github_api(),
            git_timeout_seconds: default_git_timeout(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_templates_root() -> String {
    dirs::home_dir()
        .map(|h| h.join(".bootstrapper").join("templates"))
        .unwrap_or_else(|| PathBuf::from(".bootstrapper/templates"))
        .to_string_lossy()
        .to_string()
}

fn default_builtin_dirs() -> Vec<String> {
    vec!["templates".to_string()]
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_git_timeout() -> u64 {
    300
}

fn default_max_depth() -> usize {
    6
}

/// A downstream HTTP service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
}

impl ServiceConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Downstream generation and content services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_timeout")]
    pub timeout_seconds: u64,

    /// Package generation service.
    #[serde(default = "default_bootstrapper_service")]
    pub bootstrapper: ServiceConfig,

    /// Dynamic content download service.
    #[serde(default = "default_content_service")]
    pub content_downloader: ServiceConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_gateway_timeout(),
            bootstrapper: default_bootstrapper_service(),
            content_downloader: default_content_service(),
        }
    }
}

fn default_gateway_timeout() -> u64 {
    60
}

fn default_bootstrapper_service() -> ServiceConfig {
    ServiceConfig::new("bootstrapper", 5000)
}

fn default_content_service() -> ServiceConfig {
    ServiceConfig::new("content_downloader", 5003)
}

/// Panorama (management plane) access used during enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanoramaConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Panorama ships with a self-signed certificate by default.
    #[serde(default)]
    pub verify_tls: bool,

    #[serde(default = "default_panorama_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_auth_key_lifetime")]
    pub auth_key_lifetime_hours: u32,
}

impl Default for PanoramaConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            verify_tls: false,
            timeout_seconds: default_panorama_timeout(),
            auth_key_lifetime_hours: default_auth_key_lifetime(),
        }
    }
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_panorama_timeout() -> u64 {
    30
}

fn default_auth_key_lifetime() -> u32 {
    8760
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// When set, a daily-rotated log file is written here as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
