//! Cookie value to viewer resolution.

use crate::cookie::SignedCookie;
use crate::error::{ResolveError, SessionError};
use crate::traits::{SessionStore, session_lifetime};
use chrono::{DateTime, Duration, Utc};
use portico_core::Viewer;
use std::sync::Arc;
use tracing::debug;

/// Turns an auth cookie into a [`Viewer`].
///
/// Expiry is absolute: a session older than the lifetime is rejected no
/// matter how recently it was used. Expired sessions are left in the store.
#[derive(Clone)]
pub struct SessionResolver {
    store: Arc<dyn SessionStore>,
    cookie: SignedCookie,
    lifetime: Duration,
}

impl SessionResolver {
    pub fn new(store: Arc<dyn SessionStore>, cookie: SignedCookie) -> Self {
        Self {
            store,
            cookie,
            lifetime: session_lifetime(),
        }
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn cookie(&self) -> &SignedCookie {
        &self.cookie
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub async fn resolve(&self, cookie_value: &str) -> Result<Viewer, ResolveError> {
        self.resolve_at(cookie_value, Utc::now()).await
    }

    /// [`resolve`](Self::resolve) against an explicit clock.
    pub async fn resolve_at(
        &self,
        cookie_value: &str,
        now: DateTime<Utc>,
    ) -> Result<Viewer, ResolveError> {
        let values = self.cookie.decode(cookie_value)?;
        let id = values
            .get("id")
            .filter(|id| !id.is_empty())
            .ok_or(ResolveError::MalformedCookie)?;

        let session = match self.store.find_session(id).await {
            Ok(session) => session,
            Err(SessionError::NotFound(_)) => {
                return Err(ResolveError::UnknownSession(id.clone()));
            }
            Err(err) => return Err(ResolveError::Store(err)),
        };

        if session.is_expired_at(now, self.lifetime) {
            debug!(
                session_id = %session.id,
                created_at = %session.created_at,
                "session expired"
            );
            return Err(ResolveError::SessionExpired(session.id));
        }

        Ok(session.viewer())
    }
}
