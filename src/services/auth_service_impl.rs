//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::{Store, User};
use crate::domain::UserId;
use crate::services::auth_service::{
    AuthError, AuthService, Registration, USERNAME_MAX_CHARS, USERNAME_MIN_CHARS,
};
use crate::services::validation::{FieldError, FieldErrors};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[cfg_attr(test, derive(Debug))]
struct ValidRegistration {
    username: String,
    password: String,
}

fn validate_registration(form: &Registration) -> Result<ValidRegistration, Vec<FieldError>> {
    let mut errors = FieldErrors::new();

    let username = errors.required("username", "Username", &form.username);
    if let Some(name) = &username {
        let len = name.chars().count();
        if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
            errors.add(
                "username",
                format!(
                    "Username must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters"
                ),
            );
        }
    }

    // Passwords are not trimmed: surrounding spaces are part of the secret.
    if form.password.is_empty() {
        errors.add("password", "Password is required");
    }
    if form.confirm_password.is_empty() {
        errors.add("confirm_password", "Please confirm the password");
    } else if form.confirm_password != form.password {
        errors.add("confirm_password", "Passwords do not match");
    }

    errors.finish(|| ValidRegistration {
        username: username.unwrap_or_default(),
        password: form.password.clone(),
    })
}

fn username_taken() -> AuthError {
    AuthError::Validation(vec![FieldError::new(
        "username",
        "This username is already taken. Please choose another one.",
    )])
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let valid = validate_registration(&registration).map_err(AuthError::Validation)?;

        if self
            .store
            .get_user_by_username(&valid.username)
            .await?
            .is_some()
        {
            return Err(username_taken());
        }

        let user = self
            .store
            .create_user(&valid.username, &valid.password, &self.security)
            .await?
            .ok_or_else(username_taken)?;

        metrics::counter!("wishlist_users_registered_total").increment(1);
        info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let mut errors = FieldErrors::new();
        errors.required("username", "Username", username);
        if password.is_empty() {
            errors.add("password", "Password is required");
        }
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors.into()));
        }

        self.store
            .verify_user_password(username.trim(), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn current_user(&self, id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.store.get_user_by_id(id).await?)
    }
}
