//! Channel adapter contract and implementations.
//!
//! Every delivery mechanism sits behind the same infallible contract:
//! `send(target, payload)` returns a [`SendOutcome`], never an error and
//! never a panic, so the dispatcher's fan-out loop has no special cases.
//! An adapter whose transport is not configured still satisfies the
//! contract by reporting success with a "disabled" marker.

pub mod email;
mod factory;
pub mod push;
pub mod sms;

use std::sync::Arc;

use async_trait::async_trait;

use crate::notification::{ChannelPayload, DeliveryChannel};

pub use email::EmailAdapter;
pub use factory::build_adapters;
pub use push::PushAdapter;
pub use sms::SmsAdapter;

/// Marker carried in `SendOutcome::detail` by disabled adapters.
pub const DISABLED_DETAIL: &str = "disabled";

/// Result of one delivery attempt.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub success: bool,
    /// Provider error on failure, or the "disabled" marker when no
    /// transport is configured.
    pub detail: Option<String>,
}

impl SendOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            detail: None,
        }
    }

    /// Transport not configured: delivery was not attempted, but the
    /// contract is satisfied.
    pub fn disabled() -> Self {
        Self {
            success: true,
            detail: Some(DISABLED_DETAIL.to_string()),
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: Some(detail.into()),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.detail.as_deref() == Some(DISABLED_DETAIL)
    }
}

/// One delivery mechanism.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    fn channel(&self) -> DeliveryChannel;

    /// Attempt delivery to `target`. Must not panic on misconfiguration;
    /// a missing transport reports [`SendOutcome::disabled`].
    async fn send(&self, target: &str, payload: &ChannelPayload) -> SendOutcome;
}

/// The adapters a dispatcher fans out to, constructed once at startup.
#[derive(Clone)]
pub struct AdapterSet {
    pub email: Arc<dyn ChannelAdapter>,
    pub sms: Arc<dyn ChannelAdapter>,
    pub push: Arc<dyn ChannelAdapter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        assert!(SendOutcome::ok().success);
        assert!(!SendOutcome::failure("boom").success);

        let disabled = SendOutcome::disabled();
        assert!(disabled.success);
        assert!(disabled.is_disabled());
        assert!(!SendOutcome::ok().is_disabled());
    }
}
