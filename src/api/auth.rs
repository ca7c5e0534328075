use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::types::{ApiResponse, LoginRequest, LoginResponse, RegisterRequest, UserDto};
use super::validation::{validate_login, validate_register};
use super::{ApiError, AppState};
use crate::db::RoleName;
use crate::services::RegisterUser;

// ============================================================================
// Request identity
// ============================================================================

/// Resolved identity attached to the request after the access guard passed.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub roles: Vec<String>,
    pub token: String,
}

/// Best-effort client address: forwarded headers first, since the service
/// normally sits behind a proxy.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
    {
        return Some(first.trim().to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

// ============================================================================
// Middleware
// ============================================================================

/// Access guard. Order matters: token presence, signature/expiry, live
/// session, active user. Only then does the request proceed.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(request.headers()) else {
        return Err(ApiError::unauthorized(
            "MISSING_OR_INVALID_TOKEN",
            "Missing or invalid token",
        ));
    };

    let claims = state.token_issuer().verify(&token).map_err(|_| {
        ApiError::unauthorized("INVALID_OR_EXPIRED_TOKEN", "Invalid or expired token")
    })?;

    // A cryptographically valid token is worthless without its session row;
    // logout revokes by deleting that row.
    let session = state
        .store()
        .get_live_session(&claims.sub, &token)
        .await
        .map_err(|e| ApiError::internal(format!("Session lookup failed: {e}")))?;

    if session.is_none() {
        return Err(ApiError::unauthorized(
            "INVALID_OR_EXPIRED_TOKEN",
            "Invalid or expired token",
        ));
    }

    let user = state
        .store()
        .find_user_by_id(&claims.sub)
        .await
        .map_err(|e| ApiError::internal(format!("User lookup failed: {e}")))?;

    let Some(user) = user.filter(|u| u.is_active) else {
        return Err(ApiError::unauthorized("INVALID_USER", "Invalid user"));
    };

    // Informational only; expiry never slides.
    if let Err(e) = state.store().touch_session(&user.id, &token).await {
        tracing::debug!("Failed to stamp session last_used_at: {e}");
    }

    tracing::Span::current().record("user_id", user.id.as_str());

    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email,
        username: user.username,
        roles: user.roles.into_iter().map(|r| r.name).collect(),
        token,
    });

    Ok(next.run(request).await)
}

/// Role guard for routes with an allow-list. Roles are re-read from the
/// store so a revoked role takes effect before the token expires.
pub async fn roles_guard(
    State((state, allowed)): State<(Arc<AppState>, &'static [RoleName])>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let current = request
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("INVALID_USER", "Invalid user"))?;

    let roles = state
        .store()
        .find_roles_by_user_id(&current.id)
        .await
        .map_err(|e| ApiError::internal(format!("Role lookup failed: {e}")))?;

    let has_match = roles
        .iter()
        .any(|role| allowed.iter().any(|a| a.as_str() == role.name));

    if !has_match {
        return Err(ApiError::unauthorized(
            "UNAUTHORIZED",
            "You are not authorized to access this resource",
        ));
    }

    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    validate_login(&payload)?;

    let result = state
        .auth_service()
        .authenticate(
            &payload.username,
            &payload.password,
            client_ip(&headers).as_deref(),
            user_agent(&headers).as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::success(
        "Login successful",
        LoginResponse {
            user: UserDto::from(result.user),
            access_token: result.access_token,
        },
    )))
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_register(&payload)?;

    let role = payload.role.clone();
    let user = state
        .auth_service()
        .register(registration_from(payload), &role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "User created successfully",
            UserDto::from(user),
        )),
    ))
}

/// POST /auth/logout (guarded)
pub async fn logout(
    State(state): State<Arc<AppState>>,
    current: axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .auth_service()
        .logout(&current.id, &current.token)
        .await?;

    Ok(Json(ApiResponse::message_only(
        "User logged out successfully",
    )))
}

pub(super) fn registration_from(payload: RegisterRequest) -> RegisterUser {
    RegisterUser {
        email: payload.email,
        password: payload.password,
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone_number: payload.phone_number,
        gender: payload.gender.map(|g| g.to_lowercase()),
        is_email_verified: payload.is_email_verified.unwrap_or(false),
        is_phone_verified: payload.is_phone_verified.unwrap_or(false),
        is_active: payload.is_active.unwrap_or(false),
    }
}
