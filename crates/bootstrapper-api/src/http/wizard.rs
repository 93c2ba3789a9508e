//! Wizard handlers.
//!
//! - POST   /wizard                    - Start a session
//! - GET    /wizard/{session}          - Render the session's current step
//! - GET    /wizard/{session}/{step}   - Render a step
//! - POST   /wizard/{session}/{step}   - Submit answers for a step
//! - DELETE /wizard/{session}          - End a session

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bootstrapper_gateway::GatewayResult;
use bootstrapper_workflow::{StepView, SubmitOutcome};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub step: String,
}

/// POST /wizard
pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session_id = state.engine.create_session().await;
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            step: state.engine.entry().to_string(),
        }),
    )
}

/// GET /wizard/{session}
pub async fn view_current(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<StepView>, ApiError> {
    Ok(Json(state.engine.view(&session_id, None).await?))
}

/// GET /wizard/{session}/{step}
pub async fn view_step(
    State(state): State<Arc<AppState>>,
    Path((session_id, step)): Path<(String, String)>,
) -> Result<Json<StepView>, ApiError> {
    Ok(Json(state.engine.view(&session_id, Some(&step)).await?))
}

/// POST /wizard/{session}/{step}
///
/// Answers arrive as a JSON object of strings. A terminal download is
/// streamed back as an attachment; every other outcome is JSON.
pub async fn submit_step(
    State(state): State<Arc<AppState>>,
    Path((session_id, step)): Path<(String, String)>,
    Json(answers): Json<BTreeMap<String, String>>,
) -> Result<Response, ApiError> {
    let outcome = state
        .engine
        .submit_step(&session_id, &step, &answers)
        .await?;
    Ok(outcome_response(outcome))
}

/// DELETE /wizard/{session}
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.engine.end_session(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session not found: {}", session_id)))
    }
}

fn outcome_response(outcome: SubmitOutcome) -> Response {
    match outcome {
        SubmitOutcome::Terminal {
            result:
                GatewayResult::Download {
                    bytes,
                    filename,
                    content_type,
                },
        } => {
            info!("Serving {} ({} bytes)", filename, bytes.len());
            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                Body::from(bytes),
            )
                .into_response()
        }
        SubmitOutcome::Terminal {
            result: GatewayResult::Display { status_code, .. },
        } => {
            let status = StatusCode::from_u16(status_code).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(outcome)).into_response()
        }
        SubmitOutcome::Invalid { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(outcome)).into_response()
        }
        SubmitOutcome::Next { .. } => Json(outcome).into_response(),
    }
}
