//! Domain service for registration and credential checks.
//!
//! Session handling stays at the HTTP layer; this service only answers
//! "who is this" and "may this account be created".

use thiserror::Error;

use crate::db::User;
use crate::domain::UserId;
use crate::services::validation::FieldError;

pub const USERNAME_MIN_CHARS: usize = 4;
pub const USERNAME_MAX_CHARS: usize = 80;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately says nothing about whether the username exists.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// Raw registration form input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for missing or malformed fields and
    /// for a username that is already taken.
    async fn register(&self, registration: Registration) -> Result<User, AuthError>;

    /// Verifies credentials and returns the user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown user or a wrong password.
    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError>;

    /// Resolves a session's user id. `None` if the account no longer exists.
    async fn current_user(&self, id: UserId) -> Result<Option<User>, AuthError>;
}
