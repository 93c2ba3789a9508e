//! Template catalog handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use bootstrapper_catalog::TemplateRecord;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TemplateQuery {
    pub label_key: Option<String>,
    pub label_value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub count: usize,
    pub templates: Vec<TemplateRecord>,
}

/// GET /templates?label_key=&label_value=
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TemplateQuery>,
) -> Result<Json<TemplateListResponse>, ApiError> {
    let templates = match (query.label_key, query.label_value) {
        (Some(key), Some(value)) => state.catalog().load(&key, &value).await?,
        (None, None) => state.catalog().all().await?,
        _ => {
            return Err(ApiError::BadRequest(
                "label_key and label_value must be given together".to_string(),
            ));
        }
    };

    Ok(Json(TemplateListResponse {
        count: templates.len(),
        templates,
    }))
}

/// GET /templates/{name}
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<TemplateRecord>, ApiError> {
    state
        .catalog()
        .get(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Template not found: {}", name)))
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub templates: usize,
}

/// POST /templates/reload
///
/// Drops the cached index so changes made outside this process are picked up.
pub async fn reload_templates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, ApiError> {
    state.catalog().invalidate();
    let index = state.catalog().snapshot().await?;
    info!("Template catalog reloaded: {} templates", index.len());
    Ok(Json(ReloadResponse {
        templates: index.len(),
    }))
}
