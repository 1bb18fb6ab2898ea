use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::realtime::notification_stream;
use crate::server::{api_key_auth, AppState};

use super::admin::list_audit_logs;
use super::handlers::{
    delete_notification, health, list_notifications, mark_all_notifications_read,
    mark_notification_read, metrics, stats, unread_count,
};
use super::triggers::dispatch_notification;

pub fn api_routes(state: AppState) -> Router<AppState> {
    let guarded = middleware::from_fn_with_state(state, api_key_auth);

    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(metrics))
        // Owner-scoped notification endpoints
        .nest(
            "/api/v1",
            Router::new()
                .route("/notifications", get(list_notifications))
                .route("/notifications/unread-count", get(unread_count))
                .route("/notifications/read-all", post(mark_all_notifications_read))
                .route("/notifications/stream", get(notification_stream))
                .route("/notifications/{id}/read", post(mark_notification_read))
                .route("/notifications/{id}", delete(delete_notification))
                // Administrative audit viewer
                .nest(
                    "/admin",
                    Router::new()
                        .route("/audit-logs", get(list_audit_logs))
                        .route_layer(guarded.clone()),
                ),
        )
        // Internal trigger for domain collaborators
        .nest(
            "/internal/v1",
            Router::new()
                .route("/notifications/dispatch", post(dispatch_notification))
                .route_layer(guarded),
        )
}
