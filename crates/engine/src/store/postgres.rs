//! PostgreSQL-backed user records (`users` table).

use async_trait::async_trait;
use sqlx::PgPool;

use pushgate_common::error::AppError;
use pushgate_common::types::UserRecord;

use super::UserRecordStore;

/// Reads tokens from the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRecordStore for PgUserStore {
    async fn get(&self, id: &str) -> Result<Option<UserRecord>, AppError> {
        let record: Option<UserRecord> =
            sqlx::query_as("SELECT id, push_token FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(record)
    }

    async fn clear_token(&self, id: &str) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE users SET push_token = NULL, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

        tracing::debug!(
            recipient_id = %id,
            rows = result.rows_affected(),
            "Push token cleared"
        );
        Ok(())
    }
}
