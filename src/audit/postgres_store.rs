//! PostgreSQL audit store.
//!
//! Table structure:
//!
//! ```sql
//! CREATE TABLE audit_logs (
//!     id             UUID PRIMARY KEY,
//!     actor_user_id  UUID,
//!     action         TEXT NOT NULL,
//!     entity_type    TEXT NOT NULL,
//!     entity_id      TEXT,
//!     old_values     JSONB,
//!     new_values     JSONB,
//!     ip_address     TEXT NOT NULL,
//!     user_agent     TEXT NOT NULL,
//!     request_method TEXT NOT NULL,
//!     request_url    TEXT NOT NULL,
//!     status_code    INTEGER NOT NULL,
//!     duration_ms    BIGINT NOT NULL,
//!     error_message  TEXT,
//!     metadata       JSONB NOT NULL DEFAULT '{}',
//!     created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! CREATE INDEX ON audit_logs (actor_user_id);
//! CREATE INDEX ON audit_logs (action);
//! CREATE INDEX ON audit_logs (entity_type);
//! CREATE INDEX ON audit_logs (entity_id);
//! CREATE INDEX ON audit_logs (created_at);
//! ```
//!
//! Append-only: no UPDATE or DELETE statement exists in this module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::store::{AuditStore, AuditStoreError};
use super::types::{AuditLogEntry, AuditPage, AuditQuery};

pub struct PostgresAuditStore {
    pool: PgPool,
}

impl PostgresAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AuditRow {
    id: Uuid,
    actor_user_id: Option<Uuid>,
    action: String,
    entity_type: String,
    entity_id: Option<String>,
    old_values: Option<serde_json::Value>,
    new_values: Option<serde_json::Value>,
    ip_address: String,
    user_agent: String,
    request_method: String,
    request_url: String,
    status_code: i32,
    duration_ms: i64,
    error_message: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<AuditRow> for AuditLogEntry {
    fn from(row: AuditRow) -> Self {
        Self {
            id: row.id,
            actor_user_id: row.actor_user_id,
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            old_values: row.old_values,
            new_values: row.new_values,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            request_method: row.request_method,
            request_url: row.request_url,
            status_code: row.status_code.max(0) as u16,
            duration_ms: row.duration_ms.max(0) as u64,
            error_message: row.error_message,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}

const COLUMNS: &str = "id, actor_user_id, action, entity_type, entity_id, old_values, \
                       new_values, ip_address, user_agent, request_method, request_url, \
                       status_code, duration_ms, error_message, metadata, created_at";

#[async_trait]
impl AuditStore for PostgresAuditStore {
    async fn append(&self, entry: AuditLogEntry) -> Result<(), AuditStoreError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs
                (id, actor_user_id, action, entity_type, entity_id, old_values, new_values,
                 ip_address, user_agent, request_method, request_url, status_code,
                 duration_ms, error_message, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(entry.id)
        .bind(entry.actor_user_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(&entry.request_method)
        .bind(&entry.request_url)
        .bind(entry.status_code as i32)
        .bind(entry.duration_ms as i64)
        .bind(&entry.error_message)
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, query: AuditQuery) -> Result<AuditPage, AuditStoreError> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM audit_logs
            WHERE ($1::uuid IS NULL OR actor_user_id = $1)
              AND ($2::text IS NULL OR action = $2)
              AND ($3::text IS NULL OR entity_type = $3)
              AND ($4::text IS NULL OR entity_id = $4)
              AND ($5::timestamptz IS NULL OR created_at >= $5)
              AND ($6::timestamptz IS NULL OR created_at <= $6)
            "#,
        )
        .bind(query.actor_user_id)
        .bind(&query.action)
        .bind(&query.entity_type)
        .bind(&query.entity_id)
        .bind(query.start_date)
        .bind(query.end_date)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<AuditRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS} FROM audit_logs
            WHERE ($1::uuid IS NULL OR actor_user_id = $1)
              AND ($2::text IS NULL OR action = $2)
              AND ($3::text IS NULL OR entity_type = $3)
              AND ($4::text IS NULL OR entity_id = $4)
              AND ($5::timestamptz IS NULL OR created_at >= $5)
              AND ($6::timestamptz IS NULL OR created_at <= $6)
            ORDER BY created_at DESC
            LIMIT $7 OFFSET $8
            "#,
        ))
        .bind(query.actor_user_id)
        .bind(&query.action)
        .bind(&query.entity_type)
        .bind(&query.entity_id)
        .bind(query.start_date)
        .bind(query.end_date)
        .bind(query.effective_limit() as i64)
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows.into_iter().map(AuditLogEntry::from).collect();
        Ok(AuditPage::new(items, total as u64, &query))
    }
}
