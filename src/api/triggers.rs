//! Inbound dispatch trigger for domain collaborators.
//!
//! The platform's CRUD layer calls this endpoint when a domain action
//! (donation created, enrollment approved, ...) needs a notification.
//! Gated by the API key middleware.

use axum::{extract::State, Json};

use crate::error::Result;
use crate::notification::Notification;
use crate::server::AppState;

use super::models::DispatchRequest;

#[tracing::instrument(
    name = "http.dispatch_notification",
    skip(state, request),
    fields(user_id = %request.user_id, kind = %request.kind)
)]
pub async fn dispatch_notification(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<Notification>> {
    let kind = request.kind()?;
    let options = request.options()?;

    let notification = state
        .dispatcher
        .dispatch(
            request.user_id,
            kind,
            request.title.clone(),
            request.message.clone(),
            options,
        )
        .await?;

    Ok(Json(notification))
}
