use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer, cookie::SameSite};

use crate::config::Config;
use crate::services::{AuthService, GiftService, UploadStore};
use crate::state::SharedState;

pub mod auth;
mod error;
pub mod flash;
pub mod gifts;
mod observability;
mod types;
pub mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn gifts(&self) -> &Arc<dyn GiftService> {
        &self.shared.gift_service
    }

    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.shared.uploads
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config().server;

    let session_layer = SessionManagerLayer::new(state.shared.session_store.clone())
        .with_secure(server.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_inactivity_minutes,
        )));

    let body_limit = DefaultBodyLimit::max(server.max_upload_bytes);
    let protected_routes = create_protected_router(state.clone());

    Router::new()
        .merge(protected_routes)
        .route("/", get(gifts::catalog))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/gift/{id}", get(gifts::reserve_page).post(gifts::reserve))
        .route("/health", get(observability::health))
        .route("/metrics", get(observability::get_metrics))
        .nest_service("/uploads", ServeDir::new(state.uploads().root()))
        .layer(session_layer)
        .layer(body_limit)
        .with_state(state)
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/logout", get(auth::logout))
        .route("/add_gift", get(gifts::add_gift_page).post(gifts::add_gift))
        .route("/my_gifts", get(gifts::my_gifts))
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth))
}
