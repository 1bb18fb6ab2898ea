//! Read-only administrative audit viewer. Gated by the API key
//! middleware; the audit log itself stays append-only.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::Result;
use crate::server::AppState;

use super::models::{AuditLogListResponse, AuditLogsQuery};

#[tracing::instrument(name = "http.list_audit_logs", skip(state, query))]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditLogsQuery>,
) -> Result<Json<AuditLogListResponse>> {
    let page = state.audit_store.list(query.into()).await?;
    Ok(Json(page.into()))
}
