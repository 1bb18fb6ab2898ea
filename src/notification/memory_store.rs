//! In-memory notification store.
//!
//! Used by tests and by the "memory" storage backend in development.
//! Each record lives under its own map entry, so concurrent dispatch and
//! read-state operations on different records never contend.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::store::{ListFilter, NotificationPage, NotificationStore, StoreError};
use super::types::{DeliveryFlags, Notification};

#[derive(Default)]
pub struct MemoryNotificationStore {
    records: DashMap<Uuid, Notification>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> Result<(), StoreError> {
        self.records.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn update_delivery_flags(
        &self,
        id: Uuid,
        flags: DeliveryFlags,
    ) -> Result<(), StoreError> {
        match self.records.get_mut(&id) {
            Some(mut record) => {
                record.apply_flags(flags);
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn mark_read(&self, id: Uuid, owner_user_id: Uuid) -> Result<Notification, StoreError> {
        let mut record = self
            .records
            .get_mut(&id)
            .filter(|r| r.owner_user_id == owner_user_id)
            .ok_or(StoreError::NotFound)?;

        if !record.is_read {
            record.is_read = true;
            record.read_at = Some(Utc::now());
        }

        Ok(record.clone())
    }

    async fn mark_all_read(&self, owner_user_id: Uuid) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut updated = 0;

        for mut entry in self.records.iter_mut() {
            if entry.owner_user_id == owner_user_id && !entry.is_read {
                entry.is_read = true;
                entry.read_at = Some(now);
                updated += 1;
            }
        }

        Ok(updated)
    }

    async fn unread_count(&self, owner_user_id: Uuid) -> Result<u64, StoreError> {
        let count = self
            .records
            .iter()
            .filter(|r| r.owner_user_id == owner_user_id && !r.is_read)
            .count();
        Ok(count as u64)
    }

    async fn list(
        &self,
        owner_user_id: Uuid,
        filter: ListFilter,
    ) -> Result<NotificationPage, StoreError> {
        let mut matching: Vec<Notification> = self
            .records
            .iter()
            .filter(|r| r.owner_user_id == owner_user_id)
            .filter(|r| filter.is_read.map_or(true, |read| r.is_read == read))
            .filter(|r| filter.kind.map_or(true, |kind| r.kind == kind))
            .map(|r| r.clone())
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items: Vec<Notification> = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .collect();

        Ok(NotificationPage::new(items, total, &filter))
    }

    async fn delete(&self, id: Uuid, owner_user_id: Uuid) -> Result<(), StoreError> {
        let owned = self
            .records
            .get(&id)
            .map(|r| r.owner_user_id == owner_user_id)
            .unwrap_or(false);

        if !owned {
            return Err(StoreError::NotFound);
        }

        self.records.remove(&id);
        Ok(())
    }
}
