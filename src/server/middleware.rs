use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::AppState;

/// Header carrying the authenticated user id, set by the platform's
/// gateway after it has performed real authentication. This crate trusts
/// it; authentication itself lives outside the pipeline.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Request-scoped caller identity. Absent on unauthenticated requests.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

/// Populate [`CurrentUser`] from the trusted gateway header.
pub async fn identity(mut req: Request<Body>, next: Next) -> Response {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok());

    if let Some(id) = user_id {
        req.extensions_mut().insert(CurrentUser(id));
    }

    next.run(req).await
}

/// API key authentication for internal and admin endpoints.
/// Validates the X-API-Key header against the configured api.key.
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    // If no API key is configured, allow all requests (development mode)
    let Some(expected_key) = &state.settings.api.key else {
        return Ok(next.run(req).await);
    };

    let api_key = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());

    match api_key {
        Some(key) if key == expected_key => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing API key header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
