// In-memory user store

use super::{User, UserError, UserResult, UserStore, hash_password};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use parking_lot::RwLock;
use portico_core::{ValidationError, ValidationErrors, logging::debug};
use rand::RngCore;
use std::collections::HashMap;

/// Users keyed by id, for development and tests.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    fn confirmation_token() -> String {
        let mut bytes = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

fn required(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(ValidationError::new(field, format!("{field} is required")));
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, username: &str, email: &str, password: &str) -> UserResult<User> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "username", username);
        required(&mut errors, "email", email);
        required(&mut errors, "password", password);
        errors.into_result()?;

        let email = email.trim().to_lowercase();
        if self.users.read().values().any(|user| user.email == email) {
            return Err(ValidationErrors::single("email", "email is already registered").into());
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.trim().to_string(),
            email,
            password_hash: hash_password(password)?,
            confirmation_token: Some(Self::confirmation_token()),
        };

        let mut users = self.users.write();
        if users.values().any(|existing| existing.email == user.email) {
            return Err(ValidationErrors::single("email", "email is already registered").into());
        }
        users.insert(user.id.clone(), user.clone());

        debug!(user_id = %user.id, "user created");
        Ok(user)
    }

    async fn confirm_user(&self, token: &str) -> UserResult<()> {
        if token.is_empty() {
            return Err(UserError::NotFound);
        }

        let mut users = self.users.write();
        let user = users
            .values_mut()
            .find(|user| user.confirmation_token.as_deref() == Some(token))
            .ok_or(UserError::NotFound)?;
        user.confirmation_token = None;

        debug!(user_id = %user.id, "user confirmed");
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> UserResult<User> {
        if email.trim().is_empty() {
            return Err(ValidationErrors::single("email", "email is required").into());
        }

        let email = email.trim().to_lowercase();
        self.users
            .read()
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(UserError::NotFound)
    }
}
