use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::domain::session::{CallId, Session};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Per-call dialogue state. Entries past their idle deadline are treated as absent and are
/// reclaimed by `sweep_expired`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, call_id: &CallId) -> Result<Option<Session>, SessionStoreError>;
    async fn put(&self, session: Session) -> Result<(), SessionStoreError>;
    async fn delete(&self, call_id: &CallId) -> Result<bool, SessionStoreError>;
    async fn sweep_expired(&self) -> Result<usize, SessionStoreError>;
    async fn active_count(&self) -> Result<usize, SessionStoreError>;
}

pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<CallId, Session>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), clock }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, call_id: &CallId) -> Result<Option<Session>, SessionStoreError> {
        let now = self.clock.now();
        let sessions = self.sessions.read().await;
        Ok(sessions.get(call_id).filter(|session| !session.is_expired(now)).cloned())
    }

    async fn put(&self, session: Session) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.call_id.clone(), session);
        Ok(())
    }

    async fn delete(&self, call_id: &CallId) -> Result<bool, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(call_id).is_some())
    }

    async fn sweep_expired(&self) -> Result<usize, SessionStoreError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        Ok(before - sessions.len())
    }

    async fn active_count(&self) -> Result<usize, SessionStoreError> {
        let now = self.clock.now();
        let sessions = self.sessions.read().await;
        Ok(sessions.values().filter(|session| !session.is_expired(now)).count())
    }
}
