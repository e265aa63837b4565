// Error types for the Portico request pipeline

use crate::HttpStatus;
use crate::validation::ValidationErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// User-correctable field failures; the only kind whose details are rendered.
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// A handler panicked. The backtrace is for the log only.
    #[error("panic: {message}")]
    Panic { message: String, backtrace: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => HttpStatus::BadRequest.code(),
            Error::BadRequest(_) => HttpStatus::BadRequest.code(),
            Error::Unauthorized(_) => HttpStatus::Unauthorized.code(),
            Error::Forbidden(_) => HttpStatus::Forbidden.code(),
            Error::RouteNotFound(_) => HttpStatus::NotFound.code(),
            Error::NotFound(_) => HttpStatus::NotFound.code(),
            _ => HttpStatus::InternalServerError.code(),
        }
    }

    /// Get the HttpStatus enum for this error
    pub fn http_status(&self) -> HttpStatus {
        HttpStatus::from_code(self.status_code()).unwrap_or(HttpStatus::InternalServerError)
    }

    /// The field failures carried by a validation error, if this is one.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Error::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }

    pub fn is_server_error(&self) -> bool {
        self.http_status().is_server_error()
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}
