// User accounts: the store interface and an in-memory implementation

pub mod memory;
pub mod password;

pub use memory::MemoryUserStore;
pub use password::{hash_password, verify_password};

use async_trait::async_trait;
use portico_core::ValidationErrors;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserError {
    /// Input the visitor can fix; field messages are shown on the form
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("User not found")]
    NotFound,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type UserResult<T> = std::result::Result<T, UserError>;

impl From<ValidationErrors> for UserError {
    fn from(errors: ValidationErrors) -> Self {
        UserError::Validation(errors)
    }
}

impl From<UserError> for portico_core::Error {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(errors) => portico_core::Error::Validation(errors),
            UserError::NotFound => portico_core::Error::NotFound(err.to_string()),
            other => portico_core::Error::Internal(other.to_string()),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Present until the emailed confirmation link is followed
    #[serde(skip_serializing)]
    pub confirmation_token: Option<String>,
}

impl User {
    pub fn is_confirmed(&self) -> bool {
        self.confirmation_token.is_none()
    }

    /// True when `password` matches the stored hash
    pub fn check_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }
}

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Register a new, unconfirmed user. Empty fields and a taken email are
    /// reported as [`UserError::Validation`].
    async fn create_user(&self, username: &str, email: &str, password: &str) -> UserResult<User>;

    /// Confirm the user holding `token`
    async fn confirm_user(&self, token: &str) -> UserResult<()>;

    /// An empty email is a validation error, an unknown one
    /// [`UserError::NotFound`].
    async fn find_user_by_email(&self, email: &str) -> UserResult<User>;
}
