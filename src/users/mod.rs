//! Recipient resolution.
//!
//! The dispatcher only needs the contact facts that gate channel
//! eligibility; everything else about users belongs to the platform's
//! CRUD layer and stays out of this crate.

mod memory_directory;
mod postgres_directory;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use memory_directory::MemoryRecipientDirectory;
pub use postgres_directory::PostgresRecipientDirectory;

/// Contact facts for one notification recipient.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub id: Uuid,
    pub email: Option<String>,
    pub email_verified: bool,
    pub phone_number: Option<String>,
    pub phone_verified: bool,
}

impl Recipient {
    /// Email address usable for delivery, if any.
    pub fn verified_email(&self) -> Option<&str> {
        if self.email_verified {
            self.email.as_deref()
        } else {
            None
        }
    }

    /// Phone number usable for delivery, if any.
    pub fn verified_phone(&self) -> Option<&str> {
        if self.phone_verified {
            self.phone_number.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),
}

/// Read-only lookup of recipients by user id.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Resolve a user id. `Ok(None)` means the user no longer exists;
    /// the dispatcher treats that the same as a lookup failure: the
    /// record persists, fan-out is skipped.
    async fn find(&self, user_id: Uuid) -> Result<Option<Recipient>, DirectoryError>;
}

/// Create a recipient directory based on configuration.
pub fn create_recipient_directory(
    backend: &str,
    pool: Option<sqlx::PgPool>,
) -> Arc<dyn RecipientDirectory> {
    match backend {
        "postgres" => {
            if let Some(pool) = pool {
                tracing::info!(backend = "postgres", "Creating PostgreSQL recipient directory");
                Arc::new(PostgresRecipientDirectory::new(pool))
            } else {
                tracing::warn!(
                    "PostgreSQL recipient directory requested but no pool provided, falling back to memory"
                );
                Arc::new(MemoryRecipientDirectory::new())
            }
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory recipient directory");
            Arc::new(MemoryRecipientDirectory::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verified_contacts() {
        let recipient = Recipient {
            id: Uuid::new_v4(),
            email: Some("a@b.com".to_string()),
            email_verified: false,
            phone_number: Some("+15550100".to_string()),
            phone_verified: true,
        };

        assert_eq!(recipient.verified_email(), None);
        assert_eq!(recipient.verified_phone(), Some("+15550100"));
    }
}
