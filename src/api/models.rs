//! Request and response DTOs for the HTTP boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::audit::{AuditLogEntry, AuditPage, AuditQuery};
use crate::error::AppError;
use crate::notification::{
    DeliveryChannel, DispatchOptions, ListFilter, Notification, NotificationKind,
    NotificationPage, Priority,
};

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

/// Query parameters for the owner-scoped notification listing.
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub is_read: Option<bool>,
    #[serde(default)]
    pub kind: Option<String>,
}

impl ListNotificationsQuery {
    pub fn to_filter(&self) -> Result<ListFilter, AppError> {
        let kind = match &self.kind {
            Some(raw) => Some(
                NotificationKind::parse(raw)
                    .ok_or_else(|| AppError::Validation(format!("Unknown kind: {raw}")))?,
            ),
            None => None,
        };

        Ok(ListFilter {
            page: self.page.max(1),
            limit: self.limit.clamp(1, 100),
            is_read: self.is_read,
            kind,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
    pub pagination: Pagination,
}

impl From<NotificationPage> for NotificationListResponse {
    fn from(page: NotificationPage) -> Self {
        Self {
            pagination: Pagination {
                total: page.total,
                page: page.page,
                limit: page.limit,
                pages: page.pages,
            },
            notifications: page.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// Body of the internal dispatch trigger.
#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub related_to: Option<Uuid>,
    #[serde(default)]
    pub related_type: Option<String>,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub delivery_channels: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl DispatchRequest {
    pub fn kind(&self) -> Result<NotificationKind, AppError> {
        NotificationKind::parse(&self.kind)
            .ok_or_else(|| AppError::Validation(format!("Unknown kind: {}", self.kind)))
    }

    /// Build dispatch options. Unknown channel names are skipped, never
    /// fatal; an unknown priority is a validation error.
    pub fn options(&self) -> Result<DispatchOptions, AppError> {
        let priority = match &self.priority {
            Some(raw) => Priority::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("Unknown priority: {raw}")))?,
            None => Priority::default(),
        };

        let delivery_channels = match &self.delivery_channels {
            Some(raw) => {
                let parsed: Vec<DeliveryChannel> = raw
                    .iter()
                    .filter_map(|name| {
                        let channel = DeliveryChannel::parse(name);
                        if channel.is_none() {
                            tracing::debug!(channel = %name, "Ignoring unknown delivery channel");
                        }
                        channel
                    })
                    .collect();
                parsed
            }
            None => vec![DeliveryChannel::InApp],
        };

        Ok(DispatchOptions {
            related_to: self.related_to,
            related_type: self.related_type.clone(),
            action_url: self.action_url.clone(),
            priority,
            delivery_channels,
            metadata: self
                .metadata
                .clone()
                .unwrap_or_else(|| Value::Object(Default::default())),
        })
    }
}

/// Query parameters for the read-only audit viewer.
#[derive(Debug, Deserialize)]
pub struct AuditLogsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub actor_user_id: Option<Uuid>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl From<AuditLogsQuery> for AuditQuery {
    fn from(q: AuditLogsQuery) -> Self {
        Self {
            actor_user_id: q.actor_user_id,
            action: q.action,
            entity_type: q.entity_type,
            entity_id: q.entity_id,
            start_date: q.start_date,
            end_date: q.end_date,
            page: q.page,
            limit: q.limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditLogListResponse {
    pub logs: Vec<AuditLogEntry>,
    pub pagination: Pagination,
}

impl From<AuditPage> for AuditLogListResponse {
    fn from(page: AuditPage) -> Self {
        Self {
            pagination: Pagination {
                total: page.total,
                page: page.page,
                limit: page.limit,
                pages: page.pages,
            },
            logs: page.items,
        }
    }
}
