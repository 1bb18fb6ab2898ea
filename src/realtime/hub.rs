//! In-process realtime push hub.
//!
//! Each recipient identity has exactly one logical channel; a user may
//! hold several concurrent subscriber connections (multiple tabs or
//! devices) and every one of them receives every published event. The
//! push channel adapter is the only publisher.

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::metrics::{PUSH_EVENTS_PUBLISHED_TOTAL, PUSH_SUBSCRIBERS};

pub struct RealtimeHub {
    /// user_id -> subscriber senders (supports multiple devices)
    subscribers: DashMap<Uuid, Vec<mpsc::Sender<serde_json::Value>>>,
    buffer_size: usize,
}

impl RealtimeHub {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Open a subscription on the user's channel. The subscription ends
    /// when the returned receiver is dropped; the dead sender is pruned
    /// on the next publish.
    pub fn subscribe(&self, user_id: Uuid) -> mpsc::Receiver<serde_json::Value> {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        self.subscribers.entry(user_id).or_default().push(tx);
        PUSH_SUBSCRIBERS.inc();

        tracing::debug!(user_id = %user_id, "Realtime subscriber registered");
        rx
    }

    /// Publish an event to every live subscriber of the user's channel.
    ///
    /// Fire-and-forget: a subscriber with a full buffer misses the event
    /// rather than blocking the publisher. Returns the number of
    /// subscribers the event reached.
    pub fn publish(&self, user_id: Uuid, event: &serde_json::Value) -> usize {
        PUSH_EVENTS_PUBLISHED_TOTAL.inc();

        let Some(mut senders) = self.subscribers.get_mut(&user_id) else {
            return 0;
        };

        let before = senders.len();
        senders.retain(|tx| !tx.is_closed());
        let pruned = before - senders.len();
        if pruned > 0 {
            PUSH_SUBSCRIBERS.sub(pruned as i64);
        }

        let mut reached = 0;
        for tx in senders.iter() {
            match tx.try_send(event.clone()) {
                Ok(()) => reached += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(user_id = %user_id, "Realtime subscriber buffer full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }

        let empty = senders.is_empty();
        drop(senders);
        if empty {
            self.subscribers.remove(&user_id);
        }

        reached
    }

    /// Number of live subscribers on a user's channel.
    pub fn subscriber_count(&self, user_id: Uuid) -> usize {
        self.subscribers
            .get(&user_id)
            .map(|s| s.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers_of_user() {
        let hub = RealtimeHub::new(8);
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut rx_a = hub.subscribe(user);
        let mut rx_b = hub.subscribe(user);
        let mut rx_other = hub.subscribe(other);

        let reached = hub.publish(user, &json!({"id": 1}));
        assert_eq!(reached, 2);

        assert_eq!(rx_a.recv().await.unwrap(), json!({"id": 1}));
        assert_eq!(rx_b.recv().await.unwrap(), json!({"id": 1}));
        assert!(rx_other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let hub = RealtimeHub::new(8);
        assert_eq!(hub.publish(Uuid::new_v4(), &json!({})), 0);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let hub = RealtimeHub::new(8);
        let user = Uuid::new_v4();

        let rx = hub.subscribe(user);
        drop(rx);

        assert_eq!(hub.publish(user, &json!({})), 0);
        assert_eq!(hub.subscriber_count(user), 0);
    }

    #[tokio::test]
    async fn test_full_buffer_does_not_block_publisher() {
        let hub = RealtimeHub::new(1);
        let user = Uuid::new_v4();

        let mut rx = hub.subscribe(user);
        assert_eq!(hub.publish(user, &json!({"n": 1})), 1);
        // Buffer full: second publish drops the event instead of blocking
        assert_eq!(hub.publish(user, &json!({"n": 2})), 0);

        assert_eq!(rx.recv().await.unwrap(), json!({"n": 1}));
    }
}
