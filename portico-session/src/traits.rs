//! Session record and store trait.

use crate::error::SessionResult;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use portico_core::Viewer;
use serde::{Deserialize, Serialize};

/// Absolute session lifetime, measured from creation. Access does not extend it.
pub const SESSION_LIFETIME: std::time::Duration = std::time::Duration::from_secs(30 * 60);

/// [`SESSION_LIFETIME`] as a chrono duration.
pub fn session_lifetime() -> Duration {
    Duration::seconds(SESSION_LIFETIME.as_secs() as i64)
}

/// An authenticated login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful lookup; never moves backwards.
    pub accessed_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            created_at: now,
            accessed_at: now,
        }
    }

    /// Expired once strictly more than `lifetime` has passed since creation.
    pub fn is_expired_at(&self, now: DateTime<Utc>, lifetime: Duration) -> bool {
        self.created_at < now - lifetime
    }

    /// Record an access, keeping `accessed_at` monotonic.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.accessed_at {
            self.accessed_at = now;
        }
    }

    /// The viewer this session authenticates.
    pub fn viewer(&self) -> Viewer {
        Viewer::new(self.user_id.clone(), self.id.clone())
    }
}

/// Persistent session storage.
///
/// Implementations must be safe to call from many requests at once.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session for `viewer.user_id`.
    async fn create_session(&self, viewer: &Viewer) -> SessionResult<Session>;

    /// Destroy the session named by `viewer.session_id`.
    async fn destroy_session(&self, viewer: &Viewer) -> SessionResult<()>;

    /// Look up a session and refresh its access time.
    ///
    /// Returns [`SessionError::NotFound`](crate::SessionError::NotFound) for
    /// unknown ids.
    async fn find_session(&self, id: &str) -> SessionResult<Session>;
}

/// Generate a new random session id.
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
