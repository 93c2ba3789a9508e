//! Panorama management-plane calls.
//!
//! Enrollment needs exactly two XML API requests: a `keygen` login that
//! returns an API key, and an operational command that generates a VM auth
//! key. The second reply carries the key in free text
//! (`VM auth key 1234567 generated. Expires at: ...`).

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::GatewayError;

/// Login details for a Panorama instance.
#[derive(Debug, Clone)]
pub struct PanoramaCredentials {
    /// Address, optionally with `:port`.
    pub host: String,
    pub username: String,
    pub password: String,
}

/// Obtains VM auth keys from a management plane.
#[async_trait]
pub trait ManagementPlane: Send + Sync {
    /// Log in and generate a VM auth key valid for `lifetime_hours`.
    ///
    /// `Ok(None)` means Panorama answered but the reply held no key.
    async fn vm_auth_key(
        &self,
        credentials: &PanoramaCredentials,
        lifetime_hours: u32,
    ) -> Result<Option<String>, GatewayError>;
}

/// XML API client for Panorama.
pub struct PanoramaClient {
    client: Client,
    scheme: String,
    timeout: Duration,
}

impl PanoramaClient {
    pub fn new(
        scheme: impl Into<String>,
        verify_tls: bool,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        Ok(Self {
            client,
            scheme: scheme.into(),
            timeout,
        })
    }

    fn api_url(&self, host: &str, params: &[(&str, &str)]) -> Result<Url, GatewayError> {
        let base = format!("{}://{}/api/", self.scheme, host);
        Url::parse_with_params(&base, params).map_err(|e| GatewayError::InvalidResponse {
            endpoint: host.to_string(),
            message: format!("invalid Panorama address: {}", e),
        })
    }

    async fn call(&self, host: &str, params: &[(&str, &str)]) -> Result<String, GatewayError> {
        let url = self.api_url(host, params)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(host, self.timeout.as_secs(), e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::from_reqwest(host, self.timeout.as_secs(), e))?;

        if !(200..300).contains(&status) || is_error_reply(&body) {
            return Err(GatewayError::Rejected {
                endpoint: host.to_string(),
                status,
                message: error_message(&body),
            });
        }

        Ok(body)
    }

    async fn api_key(&self, credentials: &PanoramaCredentials) -> Result<String, GatewayError> {
        let body = self
            .call(
                &credentials.host,
                &[
                    ("type", "keygen"),
                    ("user", &credentials.username),
                    ("password", &credentials.password),
                ],
            )
            .await?;

        extract_tag(&body, "key").ok_or_else(|| GatewayError::InvalidResponse {
            endpoint: credentials.host.clone(),
            message: "keygen reply has no <key>".to_string(),
        })
    }
}

#[async_trait]
impl ManagementPlane for PanoramaClient {
    async fn vm_auth_key(
        &self,
        credentials: &PanoramaCredentials,
        lifetime_hours: u32,
    ) -> Result<Option<String>, GatewayError> {
        info!("Logging in to Panorama at {}", credentials.host);
        let api_key = self.api_key(credentials).await?;

        let cmd = format!(
            "<request><bootstrap><vm-auth-key><generate><lifetime>{}</lifetime></generate></vm-auth-key></bootstrap></request>",
            lifetime_hours
        );
        let body = self
            .call(
                &credentials.host,
                &[("type", "op"), ("cmd", &cmd), ("key", &api_key)],
            )
            .await?;

        let key = parse_vm_auth_key(&body);
        match &key {
            Some(_) => debug!("Generated VM auth key on {}", credentials.host),
            None => warn!("Panorama at {} returned no VM auth key", credentials.host),
        }
        Ok(key)
    }
}

/// The key from a `VM auth key <key> generated...` reply.
pub fn parse_vm_auth_key(text: &str) -> Option<String> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"VM auth key (\S+) ").ok())
        .as_ref()?;
    pattern.captures(text).map(|c| c[1].to_string())
}

fn is_error_reply(body: &str) -> bool {
    body.contains("status=\"error\"") || body.contains("status='error'")
}

fn error_message(body: &str) -> String {
    extract_tag(body, "msg")
        .or_else(|| extract_tag(body, "line"))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Text of the first `<tag>...</tag>` element.
fn extract_tag(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    let text = body[start..end].trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
#[path = "panorama_tests.rs"]
mod tests;
