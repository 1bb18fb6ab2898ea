//! Channel adapter factory

use std::sync::Arc;

use crate::config::ChannelsConfig;
use crate::realtime::RealtimeHub;

use super::email::EmailAdapter;
use super::push::PushAdapter;
use super::sms::SmsAdapter;
use super::AdapterSet;

/// Build every channel adapter once at startup.
///
/// Adapters with missing transports come up disabled but present, so the
/// dispatcher never has to consult configuration at send time.
pub fn build_adapters(config: &ChannelsConfig, hub: Arc<RealtimeHub>) -> AdapterSet {
    AdapterSet {
        email: Arc::new(EmailAdapter::from_config(
            &config.email,
            config.frontend_base_url.clone(),
        )),
        sms: Arc::new(SmsAdapter::from_config(&config.sms)),
        push: Arc::new(PushAdapter::new(hub)),
    }
}
