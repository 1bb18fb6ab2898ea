use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One append-only record of a completed HTTP request.
///
/// Created after the response has been handed back to the transport
/// layer; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    /// User who performed the action; None when unauthenticated
    pub actor_user_id: Option<Uuid>,
    /// HTTP method or domain verb
    pub action: String,
    /// Entity affected (Donations, Users, ...), derived from the path
    pub entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Previous values, when a handler supplied them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_values: Option<serde_json::Value>,
    /// Sanitized request body snapshot for mutating methods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_values: Option<serde_json::Value>,
    pub ip_address: String,
    pub user_agent: String,
    pub request_method: String,
    pub request_url: String,
    pub status_code: u16,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Filter parameters for the read-only administrative query.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub actor_user_id: Option<Uuid>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// 1-based page number; 0 is treated as 1
    pub page: u32,
    pub limit: u32,
}

impl AuditQuery {
    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.limit as u64
    }

    pub fn effective_limit(&self) -> u32 {
        if self.limit == 0 {
            50
        } else {
            self.limit
        }
    }
}

/// One page of audit entries, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct AuditPage {
    pub items: Vec<AuditLogEntry>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl AuditPage {
    pub fn new(items: Vec<AuditLogEntry>, total: u64, query: &AuditQuery) -> Self {
        let limit = query.effective_limit();
        Self {
            items,
            total,
            page: query.page.max(1),
            limit,
            pages: total.div_ceil(limit as u64) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_paging_defaults() {
        let query = AuditQuery::default();
        assert_eq!(query.offset(), 0);
        assert_eq!(query.effective_limit(), 50);

        let query = AuditQuery {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(query.offset(), 20);
    }
}
