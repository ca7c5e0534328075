use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::RoleName;
use crate::state::SharedState;

pub mod auth;
mod client_id;
mod countries;
mod error;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

/// Roles allowed to look other users up by email.
const USER_LOOKUP_ROLES: &[RoleName] = &[RoleName::Administrator, RoleName::Teacher];

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,
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
    pub fn token_issuer(&self) -> &crate::auth::TokenIssuer {
        &self.shared.token_issuer
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn crate::services::UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn crate::services::StorageService> {
        &self.shared.storage
    }
}

pub async fn create_app_state(shared: Arc<SharedState>) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
    }))
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared).await
}

pub fn router(state: Arc<AppState>) -> Router {
    let (upload_path, cors_origins) = (
        state.config().storage.upload_path.clone(),
        state.config().server.cors_allowed_origins.clone(),
    );

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/countries", get(countries::list_countries))
        .route("/countries/code/{code}", get(countries::get_by_code))
        .route(
            "/countries/code-iso3/{codeIso3}",
            get(countries::get_by_code_iso3),
        )
        .route("/health/check", get(system::health_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            client_id::client_id_middleware,
        ))
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(upload_path),
        )
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/users/me", get(users::get_current_user))
        .route(
            "/users/{email}",
            get(users::get_user_by_email).route_layer(middleware::from_fn_with_state(
                (state.clone(), USER_LOOKUP_ROLES),
                auth::roles_guard,
            )),
        )
        .route("/users", post(users::create_user))
        .route("/users/password", put(users::change_password))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
