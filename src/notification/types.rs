use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of notification kinds domain collaborators may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DonationReceived,
    DonationAllocated,
    ImpactReport,
    EnrollmentApproved,
    EnrollmentRejected,
    TrainingStarted,
    TrainingCompleted,
    CertificateIssued,
    ChildUpdate,
    CollaborationInvite,
    CollaborationResponse,
    MessageReceived,
    UserApproved,
    UserRejected,
    System,
    Other,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DonationReceived => "donation_received",
            Self::DonationAllocated => "donation_allocated",
            Self::ImpactReport => "impact_report",
            Self::EnrollmentApproved => "enrollment_approved",
            Self::EnrollmentRejected => "enrollment_rejected",
            Self::TrainingStarted => "training_started",
            Self::TrainingCompleted => "training_completed",
            Self::CertificateIssued => "certificate_issued",
            Self::ChildUpdate => "child_update",
            Self::CollaborationInvite => "collaboration_invite",
            Self::CollaborationResponse => "collaboration_response",
            Self::MessageReceived => "message_received",
            Self::UserApproved => "user_approved",
            Self::UserRejected => "user_rejected",
            Self::System => "system",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "donation_received" => Some(Self::DonationReceived),
            "donation_allocated" => Some(Self::DonationAllocated),
            "impact_report" => Some(Self::ImpactReport),
            "enrollment_approved" => Some(Self::EnrollmentApproved),
            "enrollment_rejected" => Some(Self::EnrollmentRejected),
            "training_started" => Some(Self::TrainingStarted),
            "training_completed" => Some(Self::TrainingCompleted),
            "certificate_issued" => Some(Self::CertificateIssued),
            "child_update" => Some(Self::ChildUpdate),
            "collaboration_invite" => Some(Self::CollaborationInvite),
            "collaboration_response" => Some(Self::CollaborationResponse),
            "message_received" => Some(Self::MessageReceived),
            "user_approved" => Some(Self::UserApproved),
            "user_rejected" => Some(Self::UserRejected),
            "system" => Some(Self::System),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority levels for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One delivery mechanism for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    InApp,
    Email,
    Sms,
    Push,
}

impl DeliveryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "in_app",
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Push => "push",
        }
    }

    /// Lenient parse used at the HTTP boundary: unknown names resolve to
    /// `None` and are skipped, never fatal.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_app" => Some(Self::InApp),
            "email" => Some(Self::Email),
            "sms" => Some(Self::Sms),
            "push" => Some(Self::Push),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-channel delivery outcome flags.
///
/// A flag is true only after the channel was actually attempted and the
/// adapter reported success, never speculatively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFlags {
    pub email_sent: bool,
    pub sms_sent: bool,
    pub push_sent: bool,
}

impl DeliveryFlags {
    pub fn set(&mut self, channel: DeliveryChannel, sent: bool) {
        match channel {
            DeliveryChannel::Email => self.email_sent = sent,
            DeliveryChannel::Sms => self.sms_sent = sent,
            DeliveryChannel::Push => self.push_sent = sent,
            DeliveryChannel::InApp => {}
        }
    }
}

/// A persisted notification record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// ID of a related entity (donation, enrollment, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_to: Option<Uuid>,
    /// Type of the related entity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_type: Option<String>,
    /// URL to navigate to when the notification is opened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    pub priority: Priority,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub delivery_channels: Vec<DeliveryChannel>,
    pub email_sent: bool,
    pub sms_sent: bool,
    pub push_sent: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build the base record for a dispatch: unread, nothing sent yet.
    pub fn new(
        owner_user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        options: DispatchOptions,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_user_id,
            kind,
            title: title.into(),
            message: message.into(),
            related_to: options.related_to,
            related_type: options.related_type,
            action_url: options.action_url,
            priority: options.priority,
            is_read: false,
            read_at: None,
            delivery_channels: options.delivery_channels,
            email_sent: false,
            sms_sent: false,
            push_sent: false,
            metadata: options.metadata,
            created_at: Utc::now(),
        }
    }

    pub fn apply_flags(&mut self, flags: DeliveryFlags) {
        self.email_sent = flags.email_sent;
        self.sms_sent = flags.sms_sent;
        self.push_sent = flags.push_sent;
    }
}

/// Optional dispatch parameters.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub related_to: Option<Uuid>,
    pub related_type: Option<String>,
    pub action_url: Option<String>,
    pub priority: Priority,
    pub delivery_channels: Vec<DeliveryChannel>,
    pub metadata: serde_json::Value,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            related_to: None,
            related_type: None,
            action_url: None,
            priority: Priority::default(),
            delivery_channels: vec![DeliveryChannel::InApp],
            metadata: serde_json::Value::Object(Default::default()),
        }
    }
}

impl DispatchOptions {
    pub fn with_channels(channels: Vec<DeliveryChannel>) -> Self {
        Self {
            delivery_channels: channels,
            ..Default::default()
        }
    }
}

/// Immutable copy of the notification content handed to channel adapters
/// at spawn time.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelPayload {
    pub notification_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    pub priority: Priority,
}

impl From<&Notification> for ChannelPayload {
    fn from(n: &Notification) -> Self {
        Self {
            notification_id: n.id,
            kind: n.kind,
            title: n.title.clone(),
            message: n.message.clone(),
            action_url: n.action_url.clone(),
            priority: n.priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_notification_starts_unread_and_unsent() {
        let n = Notification::new(
            Uuid::new_v4(),
            NotificationKind::System,
            "Title",
            "Message",
            DispatchOptions::default(),
        );

        assert!(!n.is_read);
        assert!(n.read_at.is_none());
        assert!(!n.email_sent && !n.sms_sent && !n.push_sent);
        assert_eq!(n.delivery_channels, vec![DeliveryChannel::InApp]);
        assert_eq!(n.priority, Priority::Normal);
    }

    #[test]
    fn test_channel_parse_is_lenient() {
        assert_eq!(DeliveryChannel::parse("email"), Some(DeliveryChannel::Email));
        assert_eq!(DeliveryChannel::parse("carrier_pigeon"), None);
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            NotificationKind::DonationReceived,
            NotificationKind::CertificateIssued,
            NotificationKind::Other,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("unknown"), None);
    }

    #[test]
    fn test_flags_set() {
        let mut flags = DeliveryFlags::default();
        flags.set(DeliveryChannel::Email, true);
        flags.set(DeliveryChannel::InApp, true);
        assert!(flags.email_sent);
        assert!(!flags.sms_sent && !flags.push_sent);
    }
}
