use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::channels::{AdapterSet, ChannelAdapter, SendOutcome};
use crate::metrics::{DispatchMetrics, DISPATCH_DURATION};
use crate::users::RecipientDirectory;

use super::store::{ListFilter, NotificationPage, NotificationStore, StoreError};
use super::types::{
    ChannelPayload, DeliveryChannel, DeliveryFlags, DispatchOptions, Notification,
    NotificationKind,
};

/// The only error a dispatch caller can observe: the base record could
/// not be persisted. Channel failures are converted to flag state.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

/// Statistics for the notification dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Total notifications dispatched (base record persisted)
    pub total_dispatched: AtomicU64,
    /// Total channel adapter attempts
    pub channels_attempted: AtomicU64,
    /// Channel attempts that failed or timed out
    pub channels_failed: AtomicU64,
    /// Dispatches whose recipient could not be resolved
    pub recipients_missing: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_dispatched: self.total_dispatched.load(Ordering::Relaxed),
            channels_attempted: self.channels_attempted.load(Ordering::Relaxed),
            channels_failed: self.channels_failed.load(Ordering::Relaxed),
            recipients_missing: self.recipients_missing.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_dispatched: u64,
    pub channels_attempted: u64,
    pub channels_failed: u64,
    pub recipients_missing: u64,
}

/// Creates notification records and fans delivery out across channels.
///
/// Each requested channel is attempted independently: a failure or
/// timeout on one never blocks the others and never surfaces to the
/// caller. The persisted record is the durable source of truth.
pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    directory: Arc<dyn RecipientDirectory>,
    adapters: AdapterSet,
    send_timeout: Duration,
    stats: DispatcherStats,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        directory: Arc<dyn RecipientDirectory>,
        adapters: AdapterSet,
        send_timeout: Duration,
    ) -> Self {
        Self {
            store,
            directory,
            adapters,
            send_timeout,
            stats: DispatcherStats::default(),
        }
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Create a notification and attempt delivery on every requested,
    /// eligible channel.
    ///
    /// The base record is persisted first; a failure of that write is the
    /// only error the caller sees. A missing recipient skips fan-out
    /// silently. The returned record carries the flags the fan-out
    /// actually achieved.
    #[tracing::instrument(
        name = "dispatcher.dispatch",
        skip(self, title, message, options),
        fields(owner_user_id = %owner_user_id, kind = %kind)
    )]
    pub async fn dispatch(
        &self,
        owner_user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        options: DispatchOptions,
    ) -> Result<Notification, DispatchError> {
        let timer = DISPATCH_DURATION.start_timer();
        let mut notification = Notification::new(owner_user_id, kind, title, message, options);

        self.store.insert(&notification).await?;
        self.stats.total_dispatched.fetch_add(1, Ordering::Relaxed);
        DispatchMetrics::record_dispatch(kind.as_str());

        let recipient = match self.directory.find(owner_user_id).await {
            Ok(Some(recipient)) => recipient,
            Ok(None) => {
                // Record stays persisted; nothing to deliver to.
                self.stats.recipients_missing.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    notification_id = %notification.id,
                    "Recipient not found, skipping channel fan-out"
                );
                timer.observe_duration();
                return Ok(notification);
            }
            Err(e) => {
                self.stats.recipients_missing.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    notification_id = %notification.id,
                    error = %e,
                    "Recipient lookup failed, skipping channel fan-out"
                );
                timer.observe_duration();
                return Ok(notification);
            }
        };

        // Spawn one task per requested, eligible channel. Each task owns
        // an immutable copy of its inputs and bounds its own runtime, so
        // a slow or failing provider cannot affect the other channels.
        let payload = ChannelPayload::from(&notification);
        let mut attempts: Vec<(DeliveryChannel, JoinHandle<SendOutcome>)> = Vec::new();
        let mut requested: Vec<DeliveryChannel> = Vec::new();

        for channel in &notification.delivery_channels {
            if !requested.contains(channel) {
                requested.push(*channel);
            }
        }

        for channel in requested {
            let (adapter, target): (Arc<dyn ChannelAdapter>, String) = match channel {
                DeliveryChannel::InApp => continue,
                DeliveryChannel::Email => {
                    let Some(address) = recipient.verified_email() else {
                        tracing::debug!(
                            notification_id = %notification.id,
                            "Recipient has no verified email, skipping channel"
                        );
                        continue;
                    };
                    (self.adapters.email.clone(), address.to_string())
                }
                DeliveryChannel::Sms => {
                    let Some(number) = recipient.verified_phone() else {
                        tracing::debug!(
                            notification_id = %notification.id,
                            "Recipient has no verified phone number, skipping channel"
                        );
                        continue;
                    };
                    (self.adapters.sms.clone(), number.to_string())
                }
                DeliveryChannel::Push => {
                    (self.adapters.push.clone(), owner_user_id.to_string())
                }
            };

            let payload = payload.clone();
            let timeout = self.send_timeout;
            attempts.push((
                channel,
                tokio::spawn(async move {
                    match tokio::time::timeout(timeout, adapter.send(&target, &payload)).await {
                        Ok(outcome) => outcome,
                        Err(_) => SendOutcome::failure("send timed out"),
                    }
                }),
            ));
        }

        let attempted_any = !attempts.is_empty();
        let mut flags = DeliveryFlags::default();

        for (channel, handle) in attempts {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => SendOutcome::failure(format!("channel task failed: {e}")),
            };

            self.stats.channels_attempted.fetch_add(1, Ordering::Relaxed);
            DispatchMetrics::record_attempt(channel.as_str(), outcome.success);

            if outcome.success {
                if outcome.is_disabled() {
                    tracing::debug!(
                        notification_id = %notification.id,
                        channel = %channel,
                        "Channel transport disabled, delivery not attempted"
                    );
                }
            } else {
                self.stats.channels_failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    notification_id = %notification.id,
                    channel = %channel,
                    detail = outcome.detail.as_deref().unwrap_or("unknown"),
                    "Channel delivery failed"
                );
            }

            flags.set(channel, outcome.success);
        }

        if attempted_any {
            // The record is already durable; losing the flag write-back
            // is a diagnostics gap, not a dispatch failure.
            if let Err(e) = self.store.update_delivery_flags(notification.id, flags).await {
                tracing::warn!(
                    notification_id = %notification.id,
                    error = %e,
                    "Failed to persist delivery flags"
                );
            }
            notification.apply_flags(flags);
        }

        timer.observe_duration();
        Ok(notification)
    }

    /// Mark one notification read. Idempotent; owner-scoped.
    #[tracing::instrument(name = "dispatcher.mark_read", skip(self))]
    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        owner_user_id: Uuid,
    ) -> Result<Notification, StoreError> {
        self.store.mark_read(notification_id, owner_user_id).await
    }

    /// Mark every unread notification of the owner read.
    #[tracing::instrument(name = "dispatcher.mark_all_read", skip(self))]
    pub async fn mark_all_read(&self, owner_user_id: Uuid) -> Result<u64, StoreError> {
        self.store.mark_all_read(owner_user_id).await
    }

    /// Point-in-time unread count, computed by query.
    pub async fn unread_count(&self, owner_user_id: Uuid) -> Result<u64, StoreError> {
        self.store.unread_count(owner_user_id).await
    }

    /// Owner-scoped paginated listing.
    pub async fn list(
        &self,
        owner_user_id: Uuid,
        filter: ListFilter,
    ) -> Result<NotificationPage, StoreError> {
        self.store.list(owner_user_id, filter).await
    }

    /// Hard delete one notification. Owner-scoped.
    #[tracing::instrument(name = "dispatcher.delete", skip(self))]
    pub async fn delete(
        &self,
        notification_id: Uuid,
        owner_user_id: Uuid,
    ) -> Result<(), StoreError> {
        self.store.delete(notification_id, owner_user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_snapshot() {
        let stats = DispatcherStats::default();
        stats.total_dispatched.fetch_add(4, Ordering::Relaxed);
        stats.channels_failed.fetch_add(1, Ordering::Relaxed);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_dispatched, 4);
        assert_eq!(snapshot.channels_failed, 1);
        assert_eq!(snapshot.channels_attempted, 0);
    }
}
