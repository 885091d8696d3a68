use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::domain::GiftId;
use crate::services::{AuthError, FieldError, GiftError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    /// Form submitted with bad fields; every message is returned
    FormErrors(Vec<FieldError>),

    Conflict(String),

    PayloadTooLarge(String),

    InternalError(String),

    Unauthorized(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::FormErrors(fields) => write!(f, "Form has {} invalid field(s)", fields.len()),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::PayloadTooLarge(msg) => write!(f, "Payload too large: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::FormErrors(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Please correct the highlighted fields".to_string(),
            ),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        };

        let body = match self {
            Self::FormErrors(fields) => ApiResponse::<()>::field_errors(error_message, fields),
            _ => ApiResponse::<()>::error(error_message),
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(format!("{err:#}"))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::Validation(fields) => Self::FormErrors(fields),
            AuthError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

impl From<GiftError> for ApiError {
    fn from(err: GiftError) -> Self {
        match err {
            GiftError::NotFound(id) => Self::gift_not_found(id),
            GiftError::AlreadyReserved(_) => Self::Conflict(err.to_string()),
            GiftError::Validation(fields) => Self::FormErrors(fields),
            GiftError::Database(msg) => Self::DatabaseError(msg),
            GiftError::Upload(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn gift_not_found(id: GiftId) -> Self {
        Self::not_found("Gift", id)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}
