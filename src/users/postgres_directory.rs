//! Recipient directory over the platform `users` table.
//!
//! Reads only the columns channel eligibility needs:
//! `id, email, email_verified, phone_number, phone_verified`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DirectoryError, Recipient, RecipientDirectory};

pub struct PostgresRecipientDirectory {
    pool: PgPool,
}

impl PostgresRecipientDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientDirectory for PostgresRecipientDirectory {
    async fn find(&self, user_id: Uuid) -> Result<Option<Recipient>, DirectoryError> {
        let row: Option<(Uuid, Option<String>, bool, Option<String>, bool)> = sqlx::query_as(
            r#"
            SELECT id, email, email_verified, phone_number, phone_verified
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, email, email_verified, phone_number, phone_verified)| Recipient {
                id,
                email,
                email_verified,
                phone_number,
                phone_verified,
            },
        ))
    }
}
