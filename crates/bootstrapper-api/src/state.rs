//! Application state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bootstrapper_catalog::{RepositoryManager, TemplateCatalog};
use bootstrapper_workflow::WorkflowEngine;

/// Application state shared across handlers.
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
    pub repositories: Arc<RepositoryManager>,
    start_time: Instant,
}

impl AppState {
    pub fn new(engine: Arc<WorkflowEngine>, repositories: Arc<RepositoryManager>) -> Self {
        Self {
            engine,
            repositories,
            start_time: Instant::now(),
        }
    }

    /// The catalog the engine renders from and repositories invalidate.
    pub fn catalog(&self) -> &Arc<TemplateCatalog> {
        self.engine.catalog()
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
