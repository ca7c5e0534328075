//! Static client identifier gate. Every API route must present the
//! configured X-Client-Id header, independent of user authentication.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState};

/// Routes reachable without a client id: health probes and the two
/// credential endpoints browsers hit before any app context exists.
const EXCLUDED_PATHS: &[&str] = &["/health/check", "/auth/login", "/auth/register"];

pub async fn client_id_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path();
    let path = path.strip_prefix("/api").unwrap_or(path);

    if EXCLUDED_PATHS.contains(&path) {
        return Ok(next.run(request).await);
    }

    let Some(client_id) = request
        .headers()
        .get("x-client-id")
        .and_then(|v| v.to_str().ok())
    else {
        return Err(ApiError::unauthorized(
            "CLIENT_ID_REQUIRED",
            "Client ID is required",
        ));
    };

    if client_id != state.config().client.client_id {
        return Err(ApiError::unauthorized(
            "INVALID_CLIENT_ID",
            "Invalid Client ID",
        ));
    }

    Ok(next.run(request).await)
}
