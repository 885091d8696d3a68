use axum::{
    Extension, Form, Json,
    extract::{Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::info;

use super::flash::{self, FlashLevel};
use super::validation::{login_url_with_next, safe_next};
use super::{ApiError, ApiResponse, AppState, CurrentUserDto, FormView};
use crate::constants::routes::{AFTER_LOGIN, CATALOG, LOGIN};
use crate::constants::session::USER_ID;
use crate::db::User;
use crate::domain::UserId;
use crate::services::Registration;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// The logged-in user, placed in request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

// ============================================================================
// Middleware
// ============================================================================

/// Lets the request through only with a session that maps to an existing user.
/// Anyone else is sent to the login page with the original path as `next`.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(user) = current_user(&state, &session).await? {
        tracing::Span::current().record("user_id", user.id.value());
        request.extensions_mut().insert(CurrentUser(user));
        return Ok(next.run(request).await);
    }

    let original = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path(), |pq| pq.as_str());

    Ok(Redirect::to(&login_url_with_next(original)).into_response())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /login
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<NextQuery>,
) -> Result<Json<ApiResponse<FormView>>, ApiError> {
    let next = query.next.as_deref().and_then(safe_next).map(str::to_string);
    form_view(&state, &session, "login", &["username", "password"], next).await
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, ApiError> {
    let user = state.auth().login(&form.username, &form.password).await?;

    session.cycle_id().await.map_err(session_error)?;
    session.insert(USER_ID, user.id).await.map_err(session_error)?;

    info!(user_id = %user.id, username = %user.username, "User logged in");

    let target = form
        .next
        .as_deref()
        .or(query.next.as_deref())
        .and_then(safe_next)
        .unwrap_or(AFTER_LOGIN);

    Ok(Redirect::to(target))
}

/// GET /register
pub async fn register_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<FormView>>, ApiError> {
    form_view(
        &state,
        &session,
        "register",
        &["username", "password", "confirm_password"],
        None,
    )
    .await
}

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, ApiError> {
    state
        .auth()
        .register(Registration {
            username: form.username,
            password: form.password,
            confirm_password: form.confirm_password,
        })
        .await?;

    flash::push(
        &session,
        FlashLevel::Success,
        "Registration successful. Please log in.",
    )
    .await?;

    Ok(Redirect::to(LOGIN))
}

/// GET /logout
pub async fn logout(
    session: Session,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Redirect, ApiError> {
    session.flush().await.map_err(session_error)?;
    info!(user_id = %user.id, "User logged out");
    Ok(Redirect::to(CATALOG))
}

// ============================================================================
// Helpers
// ============================================================================

/// Resolves the session's user, if any. A session left pointing at a
/// vanished account is flushed.
pub async fn current_user(state: &AppState, session: &Session) -> Result<Option<User>, ApiError> {
    let Some(id) = session.get::<UserId>(USER_ID).await.map_err(session_error)? else {
        return Ok(None);
    };

    let user = state.auth().current_user(id).await?;
    if user.is_none() {
        tracing::warn!(user_id = %id, "Session refers to an unknown user, clearing it");
        session.flush().await.map_err(session_error)?;
    }

    Ok(user)
}

pub async fn form_view(
    state: &AppState,
    session: &Session,
    form: &'static str,
    fields: &'static [&'static str],
    next: Option<String>,
) -> Result<Json<ApiResponse<FormView>>, ApiError> {
    let current_user = current_user(state, session).await?;
    let flashes = flash::take(session).await?;

    Ok(Json(ApiResponse::success(FormView {
        form,
        fields,
        next,
        flashes,
        current_user: current_user.as_ref().map(CurrentUserDto::from),
    })))
}

pub fn session_error(err: tower_sessions::session::Error) -> ApiError {
    ApiError::internal(format!("Session error: {err}"))
}
