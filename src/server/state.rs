use std::sync::Arc;
use std::time::Duration;

use crate::audit::{create_audit_store, AuditStore};
use crate::channels::{build_adapters, AdapterSet};
use crate::config::Settings;
use crate::error::AppError;
use crate::infrastructure::postgres::PostgresPool;
use crate::notification::{create_notification_store, NotificationDispatcher, NotificationStore};
use crate::realtime::RealtimeHub;
use crate::users::{create_recipient_directory, RecipientDirectory};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub notification_store: Arc<dyn NotificationStore>,
    pub audit_store: Arc<dyn AuditStore>,
    pub directory: Arc<dyn RecipientDirectory>,
    pub hub: Arc<RealtimeHub>,
    pub dispatcher: Arc<NotificationDispatcher>,
}

impl AppState {
    /// Build the full application state from configuration: storage
    /// backends via their factories, adapters once at startup.
    pub async fn new(settings: Settings) -> Result<Self, AppError> {
        let pool = if settings.storage.backend == "postgres" {
            let pg = PostgresPool::new(&settings.database)
                .await
                .map_err(|e| AppError::Storage(e.to_string()))?;
            tracing::info!(url = %pg.database_url_masked(), "Connected to PostgreSQL");
            Some(pg.pool().clone())
        } else {
            None
        };

        let backend = settings.storage.backend.as_str();
        let notification_store = create_notification_store(backend, pool.clone());
        let audit_store = create_audit_store(backend, pool.clone());
        let directory = create_recipient_directory(backend, pool);
        let hub = Arc::new(RealtimeHub::new(settings.channels.push.buffer_size));
        let adapters = build_adapters(&settings.channels, hub.clone());

        Ok(Self::from_parts(
            settings,
            notification_store,
            audit_store,
            directory,
            hub,
            adapters,
        ))
    }

    /// Assemble state from pre-built components. Used by tests to wire
    /// memory stores and mock adapters.
    pub fn from_parts(
        settings: Settings,
        notification_store: Arc<dyn NotificationStore>,
        audit_store: Arc<dyn AuditStore>,
        directory: Arc<dyn RecipientDirectory>,
        hub: Arc<RealtimeHub>,
        adapters: AdapterSet,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            notification_store.clone(),
            directory.clone(),
            adapters,
            Duration::from_secs(settings.channels.send_timeout_seconds),
        ));

        Self {
            settings: Arc::new(settings),
            notification_store,
            audit_store,
            directory,
            hub,
            dispatcher,
        }
    }
}
