use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics::encode_metrics;
use crate::notification::dispatcher::DispatcherStatsSnapshot;
use crate::notification::Notification;
use crate::server::{AppState, CurrentUser};

use super::models::{
    ListNotificationsQuery, MarkAllReadResponse, NotificationListResponse, UnreadCountResponse,
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub notifications: DispatcherStatsSnapshot,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        notifications: state.dispatcher.stats(),
    })
}

pub async fn metrics() -> Result<String> {
    encode_metrics().map_err(|e| AppError::Internal(e.to_string()))
}

fn require_user(user: Option<Extension<CurrentUser>>) -> Result<Uuid> {
    user.map(|Extension(CurrentUser(id))| id)
        .ok_or_else(|| AppError::Auth("Missing caller identity".to_string()))
}

/// List the caller's notifications, newest first.
#[tracing::instrument(name = "http.list_notifications", skip(state, user, query))]
pub async fn list_notifications(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<NotificationListResponse>> {
    let user_id = require_user(user)?;
    let filter = query.to_filter()?;

    let page = state.dispatcher.list(user_id, filter).await?;
    Ok(Json(page.into()))
}

/// Mark one of the caller's notifications read.
#[tracing::instrument(name = "http.mark_read", skip(state, user))]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>> {
    let user_id = require_user(user)?;
    let notification = state.dispatcher.mark_read(id, user_id).await?;
    Ok(Json(notification))
}

/// Mark all of the caller's notifications read.
#[tracing::instrument(name = "http.mark_all_read", skip(state, user))]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<MarkAllReadResponse>> {
    let user_id = require_user(user)?;
    let updated = state.dispatcher.mark_all_read(user_id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

/// Point-in-time unread count for the caller.
#[tracing::instrument(name = "http.unread_count", skip(state, user))]
pub async fn unread_count(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<UnreadCountResponse>> {
    let user_id = require_user(user)?;
    let count = state.dispatcher.unread_count(user_id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// Hard-delete one of the caller's notifications.
#[tracing::instrument(name = "http.delete_notification", skip(state, user))]
pub async fn delete_notification(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = require_user(user)?;
    state.dispatcher.delete(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
