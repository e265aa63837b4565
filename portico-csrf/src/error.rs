use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsrfError {
    #[error("Invalid CSRF token")]
    InvalidToken,

    #[error("Missing CSRF token")]
    MissingToken,

    #[error("Missing CSRF cookie")]
    MissingCookie,

    #[error("CSRF token expired")]
    TokenExpired,

    #[error("CSRF token issued for another session")]
    SessionMismatch,

    #[error("Token validation failed: {0}")]
    ValidationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CsrfError>;

impl From<CsrfError> for portico_core::Error {
    fn from(err: CsrfError) -> Self {
        match err {
            CsrfError::Config(msg) => portico_core::Error::Config(msg),
            other => portico_core::Error::Forbidden(other.to_string()),
        }
    }
}
