//! API error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bootstrapper_catalog::{CatalogError, RepositoryError};
use bootstrapper_workflow::WorkflowError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// The request was understood but refused.
    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Workflow(e) => match e {
                WorkflowError::UnknownStep(_) | WorkflowError::SessionNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                WorkflowError::Decode(_) => StatusCode::BAD_REQUEST,
                WorkflowError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Repository(e) => match e {
                RepositoryError::InvalidName(_) => StatusCode::BAD_REQUEST,
                RepositoryError::UnsafePath(_) => StatusCode::FORBIDDEN,
                RepositoryError::AlreadyExists(_) => StatusCode::CONFLICT,
                RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
                RepositoryError::NotRepository(_) => StatusCode::UNPROCESSABLE_ENTITY,
                RepositoryError::Git(_) => StatusCode::BAD_GATEWAY,
                RepositoryError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                RepositoryError::Client(_) | RepositoryError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
