//! SMS channel over a Twilio-compatible REST API.

use async_trait::async_trait;

use crate::config::SmsConfig;
use crate::notification::{ChannelPayload, DeliveryChannel};

use super::{ChannelAdapter, SendOutcome};

struct SmsCredentials {
    account_sid: String,
    auth_token: String,
    from_number: String,
}

/// SMS adapter posting to the provider's Messages endpoint.
///
/// The API base is configurable so tests can point the adapter at a
/// local stub. Missing credentials yield a disabled adapter.
pub struct SmsAdapter {
    client: reqwest::Client,
    credentials: Option<SmsCredentials>,
    api_base: String,
}

impl SmsAdapter {
    pub fn from_config(config: &SmsConfig) -> Self {
        let credentials = match (
            config.account_sid.as_deref(),
            config.auth_token.as_deref(),
            config.from_number.as_deref(),
        ) {
            (Some(sid), Some(token), Some(from))
                if !sid.is_empty() && !token.is_empty() && !from.is_empty() =>
            {
                tracing::info!("SMS channel enabled");
                Some(SmsCredentials {
                    account_sid: sid.to_string(),
                    auth_token: token.to_string(),
                    from_number: from.to_string(),
                })
            }
            _ => {
                tracing::info!("SMS channel disabled (no credentials provided)");
                None
            }
        };

        Self {
            client: reqwest::Client::new(),
            credentials,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChannelAdapter for SmsAdapter {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Sms
    }

    async fn send(&self, target: &str, payload: &ChannelPayload) -> SendOutcome {
        let Some(credentials) = &self.credentials else {
            tracing::debug!(
                target = %target,
                "SMS channel disabled, delivery not attempted"
            );
            return SendOutcome::disabled();
        };

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, credentials.account_sid
        );
        let body = format!("{} - {}", payload.title, payload.message);
        let params = [
            ("To", target),
            ("From", credentials.from_number.as_str()),
            ("Body", body.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(&params)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(target = %target, "SMS sent");
                SendOutcome::ok()
            }
            Ok(resp) => SendOutcome::failure(format!("provider returned {}", resp.status())),
            Err(e) => SendOutcome::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_unconfigured_adapter_reports_disabled() {
        let adapter = SmsAdapter::from_config(&SmsConfig::default());
        let payload = ChannelPayload {
            notification_id: Uuid::new_v4(),
            kind: crate::notification::NotificationKind::System,
            title: "Title".to_string(),
            message: "Message".to_string(),
            action_url: None,
            priority: crate::notification::Priority::Normal,
        };

        let outcome = adapter.send("+15550100", &payload).await;
        assert!(outcome.success);
        assert!(outcome.is_disabled());
    }

    #[test]
    fn test_partial_credentials_disable_adapter() {
        let config = SmsConfig {
            account_sid: Some("AC123".to_string()),
            ..Default::default()
        };
        let adapter = SmsAdapter::from_config(&config);
        assert!(adapter.credentials.is_none());
    }
}
