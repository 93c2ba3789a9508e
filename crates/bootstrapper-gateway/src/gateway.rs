//! Package generation and content download services.

use std::time::Duration;

use async_trait::async_trait;

use crate::client::{GatewayClient, ServiceEndpoint};
use crate::error::GatewayError;
use crate::result::GatewayResult;

const GENERATE_PATH: &str = "/generate_bootstrap_package";
const DOWNLOAD_PATH: &str = "/download_content";

/// The downstream services the wizard ships its payload to.
#[async_trait]
pub trait PackageGateway: Send + Sync {
    /// Submit the full answer set for package generation.
    async fn generate_package(
        &self,
        payload: &serde_json::Value,
        filename: &str,
    ) -> Result<GatewayResult, GatewayError>;

    /// Ask the content service to fetch a dynamic content package.
    async fn download_content(
        &self,
        payload: &serde_json::Value,
    ) -> Result<GatewayResult, GatewayError>;
}

/// [`PackageGateway`] over HTTP.
pub struct ServiceGateway {
    client: GatewayClient,
    generator: ServiceEndpoint,
    content: ServiceEndpoint,
}

impl ServiceGateway {
    pub fn new(
        generator: ServiceEndpoint,
        content: ServiceEndpoint,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            client: GatewayClient::new(timeout)?,
            generator,
            content,
        })
    }
}

#[async_trait]
impl PackageGateway for ServiceGateway {
    async fn generate_package(
        &self,
        payload: &serde_json::Value,
        filename: &str,
    ) -> Result<GatewayResult, GatewayError> {
        self.client
            .send(&self.generator, GENERATE_PATH, payload, filename)
            .await
    }

    async fn download_content(
        &self,
        payload: &serde_json::Value,
    ) -> Result<GatewayResult, GatewayError> {
        self.client
            .send(&self.content, DOWNLOAD_PATH, payload, "content")
            .await
    }
}
