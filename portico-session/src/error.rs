//! Error types for session operations.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session store errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session with this id
    #[error("Session not found: {0}")]
    NotFound(String),

    /// A session was requested for a viewer without a user id
    #[error("cannot create a session without a user id")]
    MissingUserId,

    /// The backing store failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Signed cookie decoding failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CookieError {
    #[error("cookie is not in payload.signature form")]
    Format,

    #[error("cookie signature does not match")]
    Signature,

    #[error("cookie payload is not valid: {0}")]
    Payload(String),

    #[error("cookie key must be at least {0} bytes")]
    KeyTooShort(usize),
}

/// Why a cookie did not resolve to a viewer.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Signature or payload decoding failed
    #[error("invalid auth cookie: {0}")]
    InvalidCookie(#[from] CookieError),

    /// The payload has no session id
    #[error("auth cookie present but no id value")]
    MalformedCookie,

    #[error("unknown session {0}")]
    UnknownSession(String),

    /// Older than the absolute session lifetime
    #[error("session {0} expired")]
    SessionExpired(String),

    /// The store could not answer; not the visitor's fault
    #[error("session store failure: {0}")]
    Store(SessionError),
}

impl ResolveError {
    /// True when the failure came from the store rather than the cookie.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, ResolveError::Store(_))
    }
}

impl From<SessionError> for portico_core::Error {
    fn from(err: SessionError) -> Self {
        portico_core::Error::Session(err.to_string())
    }
}

impl From<ResolveError> for portico_core::Error {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Store(inner) => inner.into(),
            other => portico_core::Error::Unauthorized(other.to_string()),
        }
    }
}
