//! # Bootstrapper Config
//!
//! Configuration management for the bootstrap package wizard: server binding,
//! template locations, downstream service endpoints, Panorama access and logging.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
