//! In-memory audit store for tests and the "memory" backend.

use async_trait::async_trait;
use std::sync::RwLock;

use super::store::{AuditStore, AuditStoreError};
use super::types::{AuditLogEntry, AuditPage, AuditQuery};

/// Append-only vector behind a lock; entries are only ever pushed.
#[derive(Default)]
pub struct MemoryAuditStore {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("audit store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all entries, oldest first. Test helper.
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries
            .read()
            .expect("audit store lock poisoned")
            .clone()
    }
}

fn matches(entry: &AuditLogEntry, query: &AuditQuery) -> bool {
    if let Some(actor) = query.actor_user_id {
        if entry.actor_user_id != Some(actor) {
            return false;
        }
    }
    if let Some(action) = &query.action {
        if &entry.action != action {
            return false;
        }
    }
    if let Some(entity_type) = &query.entity_type {
        if &entry.entity_type != entity_type {
            return false;
        }
    }
    if let Some(entity_id) = &query.entity_id {
        if entry.entity_id.as_deref() != Some(entity_id.as_str()) {
            return false;
        }
    }
    if let Some(start) = query.start_date {
        if entry.created_at < start {
            return false;
        }
    }
    if let Some(end) = query.end_date {
        if entry.created_at > end {
            return false;
        }
    }
    true
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, entry: AuditLogEntry) -> Result<(), AuditStoreError> {
        self.entries
            .write()
            .expect("audit store lock poisoned")
            .push(entry);
        Ok(())
    }

    async fn list(&self, query: AuditQuery) -> Result<AuditPage, AuditStoreError> {
        let entries = self.entries.read().expect("audit store lock poisoned");

        let mut matching: Vec<AuditLogEntry> = entries
            .iter()
            .filter(|e| matches(e, &query))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items: Vec<AuditLogEntry> = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.effective_limit() as usize)
            .collect();

        Ok(AuditPage::new(items, total, &query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(action: &str, entity_type: &str) -> AuditLogEntry {
        AuditLogEntry {
            id: Uuid::new_v4(),
            actor_user_id: None,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: None,
            old_values: None,
            new_values: None,
            ip_address: "127.0.0.1".to_string(),
            user_agent: "test".to_string(),
            request_method: action.to_string(),
            request_url: "/".to_string(),
            status_code: 200,
            duration_ms: 1,
            error_message: None,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_and_filter() {
        let store = MemoryAuditStore::new();
        store.append(entry("POST", "Donations")).await.unwrap();
        store.append(entry("GET", "Donations")).await.unwrap();
        store.append(entry("POST", "Users")).await.unwrap();

        let page = store
            .list(AuditQuery {
                action: Some("POST".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let page = store
            .list(AuditQuery {
                entity_type: Some("Users".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_actor_filter() {
        let store = MemoryAuditStore::new();
        let actor = Uuid::new_v4();

        let mut with_actor = entry("GET", "Users");
        with_actor.actor_user_id = Some(actor);
        store.append(with_actor).await.unwrap();
        store.append(entry("GET", "Users")).await.unwrap();

        let page = store
            .list(AuditQuery {
                actor_user_id: Some(actor),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }
}
