//! Storage contract for the audit log.
//!
//! Append-only by construction: the trait exposes no update or delete.
//! Appends run in detached tasks, so a failure here must never surface
//! to any HTTP client; the recorder logs and discards it.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuditLogEntry, AuditPage, AuditQuery};

/// Errors that can occur during audit store operations.
#[derive(Debug, Error)]
pub enum AuditStoreError {
    /// PostgreSQL operation failed
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only audit log storage.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one entry.
    async fn append(&self, entry: AuditLogEntry) -> Result<(), AuditStoreError>;

    /// Read-only filtered query for the administrative viewer.
    async fn list(&self, query: AuditQuery) -> Result<AuditPage, AuditStoreError>;
}
