//! Audit recorder pipeline stage.
//!
//! Installed once, ahead of all route handlers. Observes every response
//! and persists one [`AuditLogEntry`] per completed request — from a
//! detached task, after the response has been handed back, so audit
//! persistence never adds latency to a response and never fails it.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::ErrorDetail;
use crate::metrics::AuditMetrics;
use crate::server::{AppState, CurrentUser};

use super::capture::{entity_id_from_request, entity_type_from_path, sanitize_snapshot};
use super::types::AuditLogEntry;

/// Explicit entity context a handler may attach to its response to
/// override the path-derived entity fields, and to supply `old_values`
/// fetched before an update.
#[derive(Debug, Clone, Default)]
pub struct EntityContext {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub old_values: Option<serde_json::Value>,
}

/// Marker proving a request already passed through the recorder.
#[derive(Debug, Clone, Copy)]
struct RecorderMark;

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn client_ip(req: &Request<Body>) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// The middleware stage. Wraps exactly once: a re-entrant installation
/// sees the marker and passes straight through.
pub async fn audit_recorder(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if !state.settings.audit.enabled || req.extensions().get::<RecorderMark>().is_some() {
        return next.run(req).await;
    }
    req.extensions_mut().insert(RecorderMark);

    let started_at = Instant::now();

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_url = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let ip_address = client_ip(&req);
    let user_agent = req
        .headers()
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let actor_user_id = req
        .extensions()
        .get::<CurrentUser>()
        .map(|CurrentUser(id)| *id);

    // Buffer the body of mutating requests for the snapshot. The outer
    // body-limit layer already bounds request sizes, so this cannot
    // grow without bound.
    let mut body_json: Option<serde_json::Value> = None;
    if is_mutating(&method) {
        let (parts, body) = req.into_parts();
        let bytes = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to buffer request body for audit");
                Default::default()
            }
        };

        if !bytes.is_empty() && bytes.len() <= state.settings.audit.snapshot_max_bytes {
            body_json = serde_json::from_slice(&bytes).ok();
        }

        req = Request::from_parts(parts, Body::from(bytes));
    }

    // Hand the request down and let the response head for the wire; the
    // audit write happens behind it.
    let response = next.run(req).await;

    let status_code = response.status().as_u16();
    let duration_ms = started_at.elapsed().as_millis() as u64;
    let error_message = response
        .extensions()
        .get::<ErrorDetail>()
        .map(|ErrorDetail(msg)| msg.clone());
    let context = response
        .extensions()
        .get::<EntityContext>()
        .cloned()
        .unwrap_or_default();

    let entity_type = context
        .entity_type
        .unwrap_or_else(|| entity_type_from_path(&path));
    let entity_id = context
        .entity_id
        .or_else(|| entity_id_from_request(&path, body_json.as_ref()));
    let new_values = body_json.as_ref().map(sanitize_snapshot);

    let entry = AuditLogEntry {
        id: Uuid::new_v4(),
        actor_user_id,
        action: method.to_string(),
        entity_type,
        entity_id,
        old_values: context.old_values,
        new_values,
        ip_address,
        user_agent,
        request_method: method.to_string(),
        request_url,
        status_code,
        duration_ms,
        error_message,
        metadata: serde_json::Value::Object(Default::default()),
        created_at: Utc::now(),
    };

    let store = state.audit_store.clone();
    tokio::spawn(async move {
        match store.append(entry).await {
            Ok(()) => AuditMetrics::record_written(),
            Err(e) => {
                // Swallowed by design of the pipeline: an audit write
                // failure must never reach a client or the next request.
                AuditMetrics::record_dropped();
                tracing::error!(error = %e, "Failed to persist audit log entry");
            }
        }
    });

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_mutating() {
        assert!(is_mutating(&Method::POST));
        assert!(is_mutating(&Method::DELETE));
        assert!(!is_mutating(&Method::GET));
        assert!(!is_mutating(&Method::HEAD));
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let req = Request::builder()
            .uri("/api/users")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "203.0.113.9");
    }

    #[test]
    fn test_client_ip_falls_back_to_socket_addr() {
        let mut req = Request::builder()
            .uri("/api/users")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo::<SocketAddr>("192.0.2.4:9000".parse().unwrap()));
        assert_eq!(client_ip(&req), "192.0.2.4");

        let bare = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(client_ip(&bare), "unknown");
    }
}
