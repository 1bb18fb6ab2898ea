//! SMTP email channel.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;
use crate::notification::{ChannelPayload, DeliveryChannel};

use super::{ChannelAdapter, SendOutcome};

/// Email adapter over an async SMTP transport.
///
/// Built once at startup; no SMTP host in the configuration means the
/// adapter runs disabled and reports success without attempting
/// delivery.
pub struct EmailAdapter {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
    from_name: String,
    frontend_base_url: Option<String>,
}

impl EmailAdapter {
    pub fn from_config(config: &EmailConfig, frontend_base_url: Option<String>) -> Self {
        let transport = match config.smtp_host.as_deref() {
            Some(host) if !host.is_empty() => {
                match AsyncSmtpTransport::<Tokio1Executor>::relay(host) {
                    Ok(builder) => {
                        let mut builder = builder.port(config.smtp_port);
                        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
                            builder = builder
                                .credentials(Credentials::new(user.clone(), pass.clone()));
                        }
                        tracing::info!(host = %host, "Email channel enabled");
                        Some(builder.build())
                    }
                    Err(e) => {
                        tracing::warn!(
                            host = %host,
                            error = %e,
                            "Invalid SMTP configuration, email channel disabled"
                        );
                        None
                    }
                }
            }
            _ => {
                tracing::info!("Email channel disabled (no SMTP host configured)");
                None
            }
        };

        Self {
            transport,
            from_address: config.from_address.clone(),
            from_name: config.from_name.clone(),
            frontend_base_url,
        }
    }

    fn body_for(&self, payload: &ChannelPayload) -> String {
        let mut body = payload.message.clone();
        if let (Some(base), Some(path)) = (&self.frontend_base_url, &payload.action_url) {
            body.push_str("\n\nView details: ");
            body.push_str(base);
            body.push_str(path);
        }
        body
    }
}

#[async_trait]
impl ChannelAdapter for EmailAdapter {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Email
    }

    async fn send(&self, target: &str, payload: &ChannelPayload) -> SendOutcome {
        let Some(transport) = &self.transport else {
            tracing::debug!(
                target = %target,
                subject = %payload.title,
                "Email channel disabled, delivery not attempted"
            );
            return SendOutcome::disabled();
        };

        let from: Mailbox = match format!("{} <{}>", self.from_name, self.from_address).parse() {
            Ok(mailbox) => mailbox,
            Err(e) => return SendOutcome::failure(format!("invalid from address: {e}")),
        };
        let to: Mailbox = match target.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => return SendOutcome::failure(format!("invalid recipient address: {e}")),
        };

        let email = match Message::builder()
            .from(from)
            .to(to)
            .subject(payload.title.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(self.body_for(payload))
        {
            Ok(message) => message,
            Err(e) => return SendOutcome::failure(format!("failed to build email: {e}")),
        };

        match transport.send(email).await {
            Ok(_) => {
                tracing::debug!(target = %target, "Email sent");
                SendOutcome::ok()
            }
            Err(e) => SendOutcome::failure(e.to_string()),
        }
    }
}
