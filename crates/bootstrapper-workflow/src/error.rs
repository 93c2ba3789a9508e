//! Workflow errors.

use bootstrapper_catalog::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Template error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Invalid encoded payload: {0}")]
    Decode(String),
}
