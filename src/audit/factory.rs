//! Audit store factory

use std::sync::Arc;

use sqlx::PgPool;

use super::memory_store::MemoryAuditStore;
use super::postgres_store::PostgresAuditStore;
use super::store::AuditStore;

/// Create an audit store based on configuration.
pub fn create_audit_store(backend: &str, pool: Option<PgPool>) -> Arc<dyn AuditStore> {
    match backend {
        "postgres" => {
            if let Some(pool) = pool {
                tracing::info!(backend = "postgres", "Creating PostgreSQL audit store");
                Arc::new(PostgresAuditStore::new(pool))
            } else {
                tracing::warn!(
                    "PostgreSQL audit store requested but no pool provided, falling back to memory"
                );
                Arc::new(MemoryAuditStore::new())
            }
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory audit store");
            Arc::new(MemoryAuditStore::new())
        }
    }
}
