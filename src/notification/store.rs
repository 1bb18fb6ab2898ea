//! Storage contract for notification records.
//!
//! The store is the durable source of truth for in-app notifications;
//! channel delivery flags are written back after fan-out. Implementations
//! must be thread-safe (`Send + Sync`) as they are shared across tasks.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::types::{DeliveryFlags, Notification, NotificationKind};

/// Errors that can occur during notification store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record absent, or owned by a different user
    #[error("notification not found")]
    NotFound,

    /// PostgreSQL operation failed
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Filter and paging parameters for the owner-scoped listing.
#[derive(Debug, Clone)]
pub struct ListFilter {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    pub is_read: Option<bool>,
    pub kind: Option<NotificationKind>,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            is_read: None,
            kind: None,
        }
    }
}

impl ListFilter {
    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.limit as u64
    }
}

/// One page of notifications, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    pub items: Vec<Notification>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl NotificationPage {
    pub fn new(items: Vec<Notification>, total: u64, filter: &ListFilter) -> Self {
        let limit = filter.limit.max(1);
        Self {
            items,
            total,
            page: filter.page.max(1),
            limit,
            pages: total.div_ceil(limit as u64) as u32,
        }
    }
}

/// Storage backend for notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a freshly built record. This is the write whose failure is
    /// the only error a dispatch caller can observe.
    async fn insert(&self, notification: &Notification) -> Result<(), StoreError>;

    /// Write back the per-channel delivery flags achieved by fan-out.
    async fn update_delivery_flags(
        &self,
        id: Uuid,
        flags: DeliveryFlags,
    ) -> Result<(), StoreError>;

    /// Mark one record read. Idempotent: `read_at` is set exactly once,
    /// on the first false→true transition. Owner-scoped.
    async fn mark_read(&self, id: Uuid, owner_user_id: Uuid) -> Result<Notification, StoreError>;

    /// Mark every unread record of the owner read. Returns the number of
    /// records updated; zero when nothing was unread.
    async fn mark_all_read(&self, owner_user_id: Uuid) -> Result<u64, StoreError>;

    /// Fresh point-in-time count of unread records. Always a query,
    /// never a maintained counter.
    async fn unread_count(&self, owner_user_id: Uuid) -> Result<u64, StoreError>;

    /// Owner-scoped paginated listing, newest first.
    async fn list(
        &self,
        owner_user_id: Uuid,
        filter: ListFilter,
    ) -> Result<NotificationPage, StoreError>;

    /// Hard delete, owner-scoped.
    async fn delete(&self, id: Uuid, owner_user_id: Uuid) -> Result<(), StoreError>;
}
