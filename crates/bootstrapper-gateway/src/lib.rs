//! # Bootstrapper Gateway
//!
//! Outbound HTTP for the wizard:
//!
//! - [`GatewayClient`] posts compiled payloads to the package generation and
//!   content download services and classifies each response with [`classify`].
//! - [`PanoramaClient`] performs the two management-plane calls needed to obtain
//!   a VM auth key during enrollment.

mod client;
mod error;
mod gateway;
mod panorama;
mod result;

pub use client::{GatewayClient, ServiceEndpoint};
pub use error::GatewayError;
pub use gateway::{PackageGateway, ServiceGateway};
pub use panorama::{ManagementPlane, PanoramaClient, PanoramaCredentials};
pub use result::{GatewayResult, classify, filename_from_disposition};
