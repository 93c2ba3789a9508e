//! Workflow engine.
//!
//! Validates step answers, merges them into the session store, runs the step
//! action and evaluates the transition. The engine owns no network or
//! filesystem state of its own; downstream services arrive as trait objects.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bootstrapper_catalog::{Renderer, TemplateCatalog};
use bootstrapper_gateway::{
    GatewayError, GatewayResult, ManagementPlane, PackageGateway, PanoramaCredentials,
};
use chrono::TimeDelta;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::compiler::{CONTENT_TEMPLATE, PayloadCompiler, encode};
use crate::error::WorkflowError;
use crate::field::{FieldKind, FieldSpec};
use crate::graph::{self, CHOICE_NONE, NAMESPACE, START};
use crate::session::{SessionHandle, SessionRegistry};
use crate::step::{StepAction, WorkflowStep};
use crate::store::WorkflowStore;

/// Warning recorded when Panorama answers without a key.
pub const NO_AUTH_KEY_WARNING: &str = "Could not get VM auth key from Panorama";

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Lifetime requested for generated VM auth keys.
    pub auth_key_lifetime_hours: u32,
    /// Sessions untouched for this long are dropped by [`WorkflowEngine::expire_idle_sessions`].
    pub session_idle_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            auth_key_lifetime_hours: 8760,
            session_idle_timeout: Duration::from_secs(60 * 60),
        }
    }
}

/// Result of submitting a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Move on to `step`.
    Next { step: String, warnings: Vec<String> },
    /// Re-render the step with these errors, keyed by field name.
    Invalid { errors: BTreeMap<String, String> },
    /// The wizard produced a final result.
    Terminal { result: GatewayResult },
}

/// A step as rendered for one session.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub session_id: String,
    pub step: String,
    pub title: String,
    pub terminal: bool,
    pub fields: Vec<FieldSpec>,
    /// Previously stored answers for the rendered fields. Passwords are omitted.
    pub values: BTreeMap<String, String>,
}

/// Either keep going with some warnings, or stop with an outcome.
enum Effect {
    Continue(Vec<String>),
    Stop(SubmitOutcome),
}

pub struct WorkflowEngine {
    steps: BTreeMap<&'static str, WorkflowStep>,
    entry: &'static str,
    catalog: Arc<TemplateCatalog>,
    compiler: PayloadCompiler,
    gateway: Arc<dyn PackageGateway>,
    panorama: Arc<dyn ManagementPlane>,
    sessions: SessionRegistry,
    settings: EngineSettings,
}

impl WorkflowEngine {
    /// Engine for the bootstrap package wizard.
    pub fn new(
        catalog: Arc<TemplateCatalog>,
        renderer: Arc<dyn Renderer>,
        gateway: Arc<dyn PackageGateway>,
        panorama: Arc<dyn ManagementPlane>,
        settings: EngineSettings,
    ) -> Self {
        Self::with_steps(
            graph::bootstrap_steps(),
            START,
            catalog,
            renderer,
            gateway,
            panorama,
            settings,
        )
    }

    pub fn with_steps(
        steps: Vec<WorkflowStep>,
        entry: &'static str,
        catalog: Arc<TemplateCatalog>,
        renderer: Arc<dyn Renderer>,
        gateway: Arc<dyn PackageGateway>,
        panorama: Arc<dyn ManagementPlane>,
        settings: EngineSettings,
    ) -> Self {
        let steps = steps.into_iter().map(|s| (s.id, s)).collect();
        Self {
            steps,
            entry,
            compiler: PayloadCompiler::new(Arc::clone(&catalog), renderer),
            catalog,
            gateway,
            panorama,
            sessions: SessionRegistry::new(entry, NAMESPACE),
            settings,
        }
    }

    pub fn step(&self, id: &str) -> Result<&WorkflowStep, WorkflowError> {
        self.steps
            .get(id)
            .ok_or_else(|| WorkflowError::UnknownStep(id.to_string()))
    }

    pub fn entry(&self) -> &'static str {
        self.entry
    }

    pub fn catalog(&self) -> &Arc<TemplateCatalog> {
        &self.catalog
    }

    pub fn compiler(&self) -> &PayloadCompiler {
        &self.compiler
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// The step `session_id` is positioned at. Unknown sessions sit at the entry step.
    pub async fn current_step(&self, session_id: &str) -> Result<&WorkflowStep, WorkflowError> {
        let current = match self.sessions.get(session_id) {
            Some(handle) => handle.lock().await.current,
            None => self.entry,
        };
        self.step(current)
    }

    /// Static fields plus those resolved from the store and the current catalog.
    pub async fn render_fields(
        &self,
        step: &WorkflowStep,
        store: &WorkflowStore,
    ) -> Result<Vec<FieldSpec>, WorkflowError> {
        let index = self.catalog.snapshot().await?;
        Ok(step.fields_for(store, &index))
    }

    /// Validate, merge, act, transition.
    ///
    /// Only fields the step renders are merged. Nothing is merged when any
    /// answer is invalid, and nothing merged is rolled back afterwards.
    pub async fn submit(
        &self,
        step_id: &str,
        store: &mut WorkflowStore,
        answers: &BTreeMap<String, String>,
    ) -> Result<SubmitOutcome, WorkflowError> {
        let step = self.step(step_id)?;
        let fields = self.render_fields(step, store).await?;

        let mut errors = BTreeMap::new();
        let mut accepted = Vec::with_capacity(fields.len());
        for field in &fields {
            match field.validate(answers.get(&field.name).map(String::as_str)) {
                Ok(Some(value)) => accepted.push((field.name.clone(), value)),
                Ok(None) => {}
                Err(message) => {
                    errors.insert(field.name.clone(), message);
                }
            }
        }
        if !errors.is_empty() {
            debug!("Step {} rejected {} answers", step.id, errors.len());
            return Ok(SubmitOutcome::Invalid { errors });
        }

        for (name, value) in accepted {
            store.set(name, value);
        }

        let warnings = match self.run_action(step, store).await {
            Effect::Continue(warnings) => warnings,
            Effect::Stop(outcome) => return Ok(outcome),
        };

        let next = match step.transition {
            Some(transition) => transition(store),
            None => step.id,
        };
        debug!("Step {} -> {}", step.id, next);
        Ok(SubmitOutcome::Next {
            step: next.to_string(),
            warnings,
        })
    }

    /// Start a new session and return its id.
    pub async fn create_session(&self) -> String {
        let handle = self.sessions.create();
        let id = handle.lock().await.id.clone();
        info!("Started wizard session {}", id);
        id
    }

    /// Render `step_id`, or the session's current step when `None`.
    pub async fn view(
        &self,
        session_id: &str,
        step_id: Option<&str>,
    ) -> Result<StepView, WorkflowError> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock().await;
        session.touch();
        let step = self.step(step_id.unwrap_or(session.current))?;
        let fields = self.render_fields(step, &session.store).await?;

        let values = fields
            .iter()
            .filter(|f| f.kind != FieldKind::Password)
            .filter_map(|f| {
                session
                    .store
                    .get(&f.name)
                    .map(|v| (f.name.clone(), v.to_string()))
            })
            .collect();

        Ok(StepView {
            session_id: session.id.clone(),
            step: step.id.to_string(),
            title: step.title.to_string(),
            terminal: step.is_terminal(),
            fields,
            values,
        })
    }

    /// Submit answers on behalf of a session. The session pointer only moves on `Next`.
    pub async fn submit_step(
        &self,
        session_id: &str,
        step_id: &str,
        answers: &BTreeMap<String, String>,
    ) -> Result<SubmitOutcome, WorkflowError> {
        let handle = self.session(session_id)?;
        let mut session = handle.lock().await;
        session.touch();

        let outcome = self.submit(step_id, &mut session.store, answers).await?;
        if let SubmitOutcome::Next { step, .. } = &outcome {
            let next = self.step(step)?.id;
            info!("Session {}: {} -> {}", session.id, session.current, next);
            session.current = next;
        }
        Ok(outcome)
    }

    /// Drop sessions idle for longer than the configured timeout.
    pub fn expire_idle_sessions(&self) -> usize {
        let max_idle =
            TimeDelta::from_std(self.settings.session_idle_timeout).unwrap_or(TimeDelta::MAX);
        let expired = self.sessions.expire_idle(max_idle);
        if expired > 0 {
            info!("Expired {} idle wizard session(s)", expired);
        }
        expired
    }

    fn session(&self, session_id: &str) -> Result<SessionHandle, WorkflowError> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| WorkflowError::SessionNotFound(session_id.to_string()))
    }

    /// Drop a session and its answers. Returns whether it existed.
    pub async fn end_session(&self, session_id: &str) -> bool {
        match self.sessions.remove(session_id) {
            Some(handle) => {
                handle.lock().await.store.clear();
                info!("Ended wizard session {}", session_id);
                true
            }
            None => false,
        }
    }

    async fn run_action(&self, step: &WorkflowStep, store: &mut WorkflowStore) -> Effect {
        match step.action {
            StepAction::None => Effect::Continue(Vec::new()),
            StepAction::NormalizeCloud => {
                graph::normalize_cloud(store);
                Effect::Continue(Vec::new())
            }
            StepAction::EnrollPanorama => self.enroll_panorama(store).await,
            StepAction::SelectTemplate => {
                if store.get_or("custom_bootstrap", CHOICE_NONE) == CHOICE_NONE {
                    store.set("bootstrap_string", "");
                }
                Effect::Continue(Vec::new())
            }
            StepAction::RenderBootstrap => match self.compiler.bootstrap_text(store).await {
                Ok(text) => {
                    store.set("bootstrap_string", encode(&text));
                    Effect::Continue(Vec::new())
                }
                Err(e) => {
                    warn!("Bootstrap template failed to render: {}", e);
                    let errors = BTreeMap::from([("custom_bootstrap".to_string(), e.to_string())]);
                    Effect::Stop(SubmitOutcome::Invalid { errors })
                }
            },
            StepAction::DownloadContent => self.download_content(store).await,
            StepAction::ShipPackage => self.ship_package(store).await,
        }
    }

    async fn enroll_panorama(&self, store: &mut WorkflowStore) -> Effect {
        let credentials = PanoramaCredentials {
            host: store.get_or("panorama_ip", "").to_string(),
            username: store.get_or("panorama_user", "admin").to_string(),
            password: store.get_or("panorama_password", "").to_string(),
        };

        match self
            .panorama
            .vm_auth_key(&credentials, self.settings.auth_key_lifetime_hours)
            .await
        {
            Ok(Some(key)) => {
                info!("Obtained VM auth key from Panorama at {}", credentials.host);
                store.set("vm_auth_key", key);
                Effect::Continue(Vec::new())
            }
            Ok(None) => {
                warn!("Panorama at {} returned no VM auth key", credentials.host);
                Effect::Continue(vec![NO_AUTH_KEY_WARNING.to_string()])
            }
            Err(GatewayError::Rejected { message, .. }) => {
                warn!("Panorama at {} rejected login: {}", credentials.host, message);
                let errors = BTreeMap::from([(
                    "panorama_password".to_string(),
                    format!("Panorama rejected the credentials: {}", message),
                )]);
                Effect::Stop(SubmitOutcome::Invalid { errors })
            }
            Err(e) => {
                warn!("Could not contact Panorama at {}: {}", credentials.host, e);
                Effect::Stop(SubmitOutcome::Terminal {
                    result: GatewayResult::display(
                        format!("Could not contact Panorama at {}: {}", credentials.host, e),
                        503,
                    ),
                })
            }
        }
    }

    async fn download_content(&self, store: &WorkflowStore) -> Effect {
        let package = store.get_or("package", "appthreat").to_string();
        let config = match self
            .compiler
            .render(CONTENT_TEMPLATE, store, Some(&["package"][..]))
            .await
        {
            Ok(config) => config,
            Err(e) => {
                warn!("Content request template failed to render: {}", e);
                return Effect::Continue(vec![format!("Could not prepare content download: {}", e)]);
            }
        };

        let payload = serde_json::json!({ "package": package, "config": config });
        match self.gateway.download_content(&payload).await {
            Ok(result) if result.is_success() => {
                info!("Requested dynamic content package {}", package);
                Effect::Continue(Vec::new())
            }
            Ok(GatewayResult::Display { text, status_code }) => {
                warn!("Content service answered {}: {}", status_code, text);
                Effect::Continue(vec![format!(
                    "Content download failed ({}): {}",
                    status_code, text
                )])
            }
            Ok(GatewayResult::Download { .. }) => Effect::Continue(Vec::new()),
            Err(e) => {
                warn!("Content download failed: {}", e);
                Effect::Continue(vec![format!("Content download failed: {}", e)])
            }
        }
    }

    async fn ship_package(&self, store: &mut WorkflowStore) -> Effect {
        let artifacts = match self.compiler.compile_artifacts(store).await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                warn!("Could not compile bootstrap artifacts: {}", e);
                return Effect::Stop(SubmitOutcome::Terminal {
                    result: GatewayResult::display(
                        format!("Could not compile bootstrap package: {}", e),
                        500,
                    ),
                });
            }
        };
        store.set("bootstrap_string", encode(&artifacts.bootstrap_text));
        store.set("init_cfg_string", encode(&artifacts.init_config_text));

        let hostname = store.get_or("hostname", "bootstrap").to_string();
        info!("Submitting bootstrap package for {}", hostname);
        let result = match self.gateway.generate_package(&store.to_json(), &hostname).await {
            Ok(result) => result,
            Err(e) if e.is_connection_failure() => GatewayResult::display(
                format!("Could not contact the bootstrap generation service: {}", e),
                503,
            ),
            Err(e) => GatewayResult::display(e.to_string(), 502),
        };
        if !result.is_success() {
            warn!("Package generation for {} did not succeed", hostname);
        }
        Effect::Stop(SubmitOutcome::Terminal { result })
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
