//! In-process session store.

use crate::error::{SessionError, SessionResult};
use crate::traits::{Session, SessionStore, generate_session_id};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use portico_core::Viewer;
use std::collections::HashMap;
use tracing::debug;

/// Sessions kept in a map behind a lock. Suitable for development and tests;
/// nothing survives a restart and expired sessions are never swept.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a session as-is, replacing any with the same id.
    pub fn insert(&self, session: Session) {
        self.sessions.write().insert(session.id.clone(), session);
    }

    /// Read a session without touching it.
    pub fn peek(&self, id: &str) -> Option<Session> {
        self.sessions.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, viewer: &Viewer) -> SessionResult<Session> {
        if viewer.user_id.is_empty() {
            return Err(SessionError::MissingUserId);
        }
        let session = Session::new(generate_session_id(), viewer.user_id.clone(), Utc::now());
        self.insert(session.clone());
        debug!(session_id = %session.id, user_id = %session.user_id, "created session");
        Ok(session)
    }

    async fn destroy_session(&self, viewer: &Viewer) -> SessionResult<()> {
        match self.sessions.write().remove(&viewer.session_id) {
            Some(_) => Ok(()),
            None => Err(SessionError::NotFound(viewer.session_id.clone())),
        }
    }

    async fn find_session(&self, id: &str) -> SessionResult<Session> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        session.touch(Utc::now());
        Ok(session.clone())
    }
}
