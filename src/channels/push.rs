//! Realtime push channel.
//!
//! Publishes to the recipient's single logical channel on the in-process
//! hub. Inherently fire-and-forget: there is no delivery acknowledgment,
//! so a successful outcome means "publish attempted", not "received".

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::notification::{ChannelPayload, DeliveryChannel};
use crate::realtime::RealtimeHub;

use super::{ChannelAdapter, SendOutcome};

pub struct PushAdapter {
    hub: Arc<RealtimeHub>,
}

impl PushAdapter {
    pub fn new(hub: Arc<RealtimeHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl ChannelAdapter for PushAdapter {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Push
    }

    async fn send(&self, target: &str, payload: &ChannelPayload) -> SendOutcome {
        let user_id = match Uuid::parse_str(target) {
            Ok(id) => id,
            Err(e) => return SendOutcome::failure(format!("invalid push target: {e}")),
        };

        let event = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => return SendOutcome::failure(format!("failed to serialize event: {e}")),
        };

        let reached = self.hub.publish(user_id, &event);
        tracing::debug!(
            user_id = %user_id,
            notification_id = %payload.notification_id,
            reached = reached,
            "Push event published"
        );

        SendOutcome::ok()
    }
}
