use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{DirectoryError, Recipient, RecipientDirectory};

/// In-memory recipient directory for tests and development.
#[derive(Default)]
pub struct MemoryRecipientDirectory {
    recipients: DashMap<Uuid, Recipient>,
}

impl MemoryRecipientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, recipient: Recipient) {
        self.recipients.insert(recipient.id, recipient);
    }

    pub fn remove(&self, user_id: Uuid) {
        self.recipients.remove(&user_id);
    }
}

#[async_trait]
impl RecipientDirectory for MemoryRecipientDirectory {
    async fn find(&self, user_id: Uuid) -> Result<Option<Recipient>, DirectoryError> {
        Ok(self.recipients.get(&user_id).map(|r| r.clone()))
    }
}
