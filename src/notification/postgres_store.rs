//! PostgreSQL notification store.
//!
//! Table structure:
//!
//! ```sql
//! CREATE TABLE notifications (
//!     id                UUID PRIMARY KEY,
//!     owner_user_id     UUID NOT NULL,
//!     kind              TEXT NOT NULL,
//!     title             TEXT NOT NULL,
//!     message           TEXT NOT NULL,
//!     related_to        UUID,
//!     related_type      TEXT,
//!     action_url        TEXT,
//!     priority          TEXT NOT NULL DEFAULT 'normal',
//!     is_read           BOOLEAN NOT NULL DEFAULT FALSE,
//!     read_at           TIMESTAMPTZ,
//!     delivery_channels TEXT[] NOT NULL DEFAULT '{in_app}',
//!     email_sent        BOOLEAN NOT NULL DEFAULT FALSE,
//!     sms_sent          BOOLEAN NOT NULL DEFAULT FALSE,
//!     push_sent         BOOLEAN NOT NULL DEFAULT FALSE,
//!     metadata          JSONB NOT NULL DEFAULT '{}',
//!     created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! CREATE INDEX ON notifications (owner_user_id);
//! CREATE INDEX ON notifications (owner_user_id, is_read);
//! CREATE INDEX ON notifications (created_at);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::store::{ListFilter, NotificationPage, NotificationStore, StoreError};
use super::types::{DeliveryChannel, DeliveryFlags, Notification, NotificationKind, Priority};

pub struct PostgresNotificationStore {
    pool: PgPool,
}

impl PostgresNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw row shape; enums are stored as TEXT and parsed leniently so an
/// unknown value in an old row never poisons a whole listing.
#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    owner_user_id: Uuid,
    kind: String,
    title: String,
    message: String,
    related_to: Option<Uuid>,
    related_type: Option<String>,
    action_url: Option<String>,
    priority: String,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    delivery_channels: Vec<String>,
    email_sent: bool,
    sms_sent: bool,
    push_sent: bool,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            owner_user_id: row.owner_user_id,
            kind: NotificationKind::parse(&row.kind).unwrap_or(NotificationKind::Other),
            title: row.title,
            message: row.message,
            related_to: row.related_to,
            related_type: row.related_type,
            action_url: row.action_url,
            priority: Priority::parse(&row.priority).unwrap_or_default(),
            is_read: row.is_read,
            read_at: row.read_at,
            delivery_channels: row
                .delivery_channels
                .iter()
                .filter_map(|c| DeliveryChannel::parse(c))
                .collect(),
            email_sent: row.email_sent,
            sms_sent: row.sms_sent,
            push_sent: row.push_sent,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}

const COLUMNS: &str = "id, owner_user_id, kind, title, message, related_to, related_type, \
                       action_url, priority, is_read, read_at, delivery_channels, email_sent, \
                       sms_sent, push_sent, metadata, created_at";

#[async_trait]
impl NotificationStore for PostgresNotificationStore {
    async fn insert(&self, notification: &Notification) -> Result<(), StoreError> {
        let channels: Vec<String> = notification
            .delivery_channels
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();

        sqlx::query(
            r#"
            INSERT INTO notifications
                (id, owner_user_id, kind, title, message, related_to, related_type,
                 action_url, priority, is_read, read_at, delivery_channels,
                 email_sent, sms_sent, push_sent, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(notification.id)
        .bind(notification.owner_user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.related_to)
        .bind(&notification.related_type)
        .bind(&notification.action_url)
        .bind(notification.priority.as_str())
        .bind(notification.is_read)
        .bind(notification.read_at)
        .bind(&channels)
        .bind(notification.email_sent)
        .bind(notification.sms_sent)
        .bind(notification.push_sent)
        .bind(&notification.metadata)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_delivery_flags(
        &self,
        id: Uuid,
        flags: DeliveryFlags,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET email_sent = $2, sms_sent = $3, push_sent = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(flags.email_sent)
        .bind(flags.sms_sent)
        .bind(flags.push_sent)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn mark_read(&self, id: Uuid, owner_user_id: Uuid) -> Result<Notification, StoreError> {
        // COALESCE keeps the timestamp from the first transition, making
        // repeated calls (including concurrent ones) no-ops.
        let row: Option<NotificationRow> = sqlx::query_as(&format!(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND owner_user_id = $2
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(owner_user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Notification::from).ok_or(StoreError::NotFound)
    }

    async fn mark_all_read(&self, owner_user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = NOW()
            WHERE owner_user_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(owner_user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn unread_count(&self, owner_user_id: Uuid) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE owner_user_id = $1 AND is_read = FALSE",
        )
        .bind(owner_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }

    async fn list(
        &self,
        owner_user_id: Uuid,
        filter: ListFilter,
    ) -> Result<NotificationPage, StoreError> {
        let kind = filter.kind.map(|k| k.as_str().to_string());

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE owner_user_id = $1
              AND ($2::boolean IS NULL OR is_read = $2)
              AND ($3::text IS NULL OR kind = $3)
            "#,
        )
        .bind(owner_user_id)
        .bind(filter.is_read)
        .bind(&kind)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<NotificationRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS} FROM notifications
            WHERE owner_user_id = $1
              AND ($2::boolean IS NULL OR is_read = $2)
              AND ($3::text IS NULL OR kind = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        ))
        .bind(owner_user_id)
        .bind(filter.is_read)
        .bind(&kind)
        .bind(filter.limit as i64)
        .bind(filter.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows.into_iter().map(Notification::from).collect();
        Ok(NotificationPage::new(items, total as u64, &filter))
    }

    async fn delete(&self, id: Uuid, owner_user_id: Uuid) -> Result<(), StoreError> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE id = $1 AND owner_user_id = $2")
                .bind(id)
                .bind(owner_user_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
