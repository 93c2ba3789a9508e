//! Wizard sessions.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::store::WorkflowStore;

/// One operator's walk through the wizard.
#[derive(Debug)]
pub struct WorkflowSession {
    pub id: String,
    /// Step the session is positioned at.
    pub current: &'static str,
    pub store: WorkflowStore,
    pub started_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl WorkflowSession {
    pub fn new(id: impl Into<String>, entry: &'static str, namespace: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            current: entry,
            store: WorkflowStore::new(namespace),
            started_at: now,
            last_active: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

pub type SessionHandle = Arc<Mutex<WorkflowSession>>;

/// Live sessions. Each session sits behind its own lock, so concurrent
/// sessions never contend.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionHandle>,
    entry: &'static str,
    namespace: String,
}

impl SessionRegistry {
    pub fn new(entry: &'static str, namespace: impl Into<String>) -> Self {
        Self {
            sessions: DashMap::new(),
            entry,
            namespace: namespace.into(),
        }
    }

    /// Start a session with a fresh id.
    pub fn create(&self) -> SessionHandle {
        let id = Uuid::new_v4().to_string();
        let handle = Arc::new(Mutex::new(WorkflowSession::new(
            &id,
            self.entry,
            &self.namespace,
        )));
        self.sessions.insert(id.clone(), Arc::clone(&handle));
        debug!("Created session {}", id);
        handle
    }

    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.remove(id).map(|(_, handle)| handle)
    }

    /// Drop sessions idle for longer than `max_idle`. Sessions locked by a
    /// request in flight are kept. Returns how many were dropped.
    pub fn expire_idle(&self, max_idle: TimeDelta) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|id, handle| match handle.try_lock() {
            Ok(session) if now - session.last_active > max_idle => {
                debug!("Expired idle session {}", id);
                false
            }
            _ => true,
        });
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = SessionRegistry::new("start", "bootstrapper");
        let handle = registry.create();
        let id = handle.lock().await.id.clone();

        let found = registry.get(&id).unwrap();
        let session = found.lock().await;
        assert_eq!(session.current, "start");
        assert_eq!(session.store.namespace(), "bootstrapper");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_created() {
        let registry = SessionRegistry::new("start", "bootstrapper");
        assert!(registry.get("made-up").is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = SessionRegistry::new("start", "bootstrapper");
        let id = registry.create().lock().await.id.clone();
        assert!(registry.remove(&id).is_some());
        assert!(registry.get(&id).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_expire_idle() {
        let registry = SessionRegistry::new("start", "bootstrapper");
        let stale = registry.create();
        stale.lock().await.last_active = Utc::now() - TimeDelta::hours(2);
        let fresh_id = registry.create().lock().await.id.clone();

        assert_eq!(registry.expire_idle(TimeDelta::hours(1)), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&fresh_id).is_some());
    }

    #[tokio::test]
    async fn test_expire_idle_keeps_busy_sessions() {
        let registry = SessionRegistry::new("start", "bootstrapper");
        let handle = registry.create();
        let mut session = handle.lock().await;
        session.last_active = Utc::now() - TimeDelta::hours(2);

        assert_eq!(registry.expire_idle(TimeDelta::hours(1)), 0);
        assert_eq!(registry.len(), 1);
    }
}
