//! Notification store factory

use std::sync::Arc;

use sqlx::PgPool;

use super::memory_store::MemoryNotificationStore;
use super::postgres_store::PostgresNotificationStore;
use super::store::NotificationStore;

/// Create a notification store based on configuration.
///
/// - `"postgres"`: requires a PostgreSQL pool
/// - `"memory"`: in-process store for tests and development
///
/// An unusable postgres selection falls back to memory with a warning so
/// a misconfigured environment still starts.
pub fn create_notification_store(
    backend: &str,
    pool: Option<PgPool>,
) -> Arc<dyn NotificationStore> {
    match backend {
        "postgres" => {
            if let Some(pool) = pool {
                tracing::info!(backend = "postgres", "Creating PostgreSQL notification store");
                Arc::new(PostgresNotificationStore::new(pool))
            } else {
                tracing::warn!(
                    "PostgreSQL notification store requested but no pool provided, falling back to memory"
                );
                Arc::new(MemoryNotificationStore::new())
            }
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory notification store");
            Arc::new(MemoryNotificationStore::new())
        }
    }
}
