//! HTTP client for downstream services.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use tracing::{debug, info};

use crate::error::GatewayError;
use crate::result::{GatewayResult, classify};

/// Host and port of a downstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL, `http://host:port`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Posts JSON payloads and classifies the replies.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    timeout: Duration,
}

impl GatewayClient {
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bootstrapper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// POST `body` to `endpoint` + `path`.
    pub async fn send(
        &self,
        endpoint: &ServiceEndpoint,
        path: &str,
        body: &serde_json::Value,
        fallback_filename: &str,
    ) -> Result<GatewayResult, GatewayError> {
        let url = format!("{}{}", endpoint.base_url(), path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(&url, self.timeout.as_secs(), e))?;

        let status = response.status().as_u16();
        let content_type = header_value(&response, CONTENT_TYPE);
        let disposition = header_value(&response, CONTENT_DISPOSITION);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::from_reqwest(&url, self.timeout.as_secs(), e))?;

        let result = classify(
            status,
            content_type.as_deref(),
            disposition.as_deref(),
            bytes,
            fallback_filename,
        );

        match &result {
            GatewayResult::Display { status_code, .. } => {
                info!("{} answered {} with text", url, status_code)
            }
            GatewayResult::Download { filename, bytes, .. } => {
                info!("{} returned {} ({} bytes)", url, filename, bytes.len())
            }
        }

        Ok(result)
    }
}

fn header_value(
    response: &reqwest::Response,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
