//! Template repository handlers.
//!
//! - GET    /repositories               - List imported repositories
//! - POST   /repositories               - Import a repository
//! - POST   /repositories/{name}/update - Pull the latest changes
//! - DELETE /repositories/{name}        - Remove a repository

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use bootstrapper_catalog::{RemoveOutcome, RepositoryRecord};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_BRANCH: &str = "master";

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    pub repo_name: String,
}

#[derive(Debug, Serialize)]
pub struct RepositoryListResponse {
    pub count: usize,
    pub repositories: Vec<RepositoryRecord>,
}

/// GET /repositories
pub async fn list_repositories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RepositoryListResponse>, ApiError> {
    let repositories = state.repositories.list().await?;
    Ok(Json(RepositoryListResponse {
        count: repositories.len(),
        repositories,
    }))
}

/// POST /repositories
pub async fn import_repository(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.url.trim().is_empty() {
        return Err(ApiError::BadRequest("url is required".to_string()));
    }
    let branch = if request.branch.trim().is_empty() {
        DEFAULT_BRANCH
    } else {
        request.branch.as_str()
    };

    info!("Importing {} as {}", request.url, request.repo_name);
    let record = state
        .repositories
        .import(&request.repo_name, &request.url, branch)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /repositories/{name}/update
pub async fn update_repository(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<RepositoryRecord>, ApiError> {
    Ok(Json(state.repositories.update(&name).await?))
}

/// DELETE /repositories/{name}
pub async fn remove_repository(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.repositories.remove(&name).await? {
        RemoveOutcome::Removed => Ok(Json(serde_json::json!({ "removed": name }))),
        RemoveOutcome::Refused(reason) => {
            warn!("Refused to remove {}: {}", name, reason);
            Err(ApiError::Forbidden(reason))
        }
        RemoveOutcome::NotFound => Err(ApiError::NotFound(format!(
            "Repository not found: {}",
            name
        ))),
    }
}
