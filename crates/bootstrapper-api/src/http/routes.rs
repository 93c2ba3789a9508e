//! HTTP route definitions.

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::http::{health, repositories, templates, wizard};
use crate::state::AppState;

/// Create the router.
///
/// ```text
/// /health                             - Health check
///
/// /wizard
///   POST   /wizard                    - Start a session
///   GET    /wizard/{session}          - Current step
///   DELETE /wizard/{session}          - End a session
///   GET    /wizard/{session}/{step}   - Render a step
///   POST   /wizard/{session}/{step}   - Submit a step
///
/// /templates
///   GET    /templates?label_key=&label_value=
///   GET    /templates/{name}
///   POST   /templates/reload          - Rescan template sources
///
/// /repositories
///   GET    /repositories
///   POST   /repositories              - {url, branch, repo_name}
///   POST   /repositories/{name}/update
///   DELETE /repositories/{name}
/// ```
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/wizard", post(wizard::create_session))
        .route(
            "/wizard/{session}",
            get(wizard::view_current).delete(wizard::end_session),
        )
        .route(
            "/wizard/{session}/{step}",
            get(wizard::view_step).post(wizard::submit_step),
        )
        .route("/templates", get(templates::list_templates))
        .route("/templates/reload", post(templates::reload_templates))
        .route("/templates/{name}", get(templates::get_template))
        .route(
            "/repositories",
            get(repositories::list_repositories).post(repositories::import_repository),
        )
        .route(
            "/repositories/{name}/update",
            post(repositories::update_repository),
        )
        .route("/repositories/{name}", delete(repositories::remove_repository))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
