//! Redis-backed user records.
//!
//! Each user is a hash at `user:{id}`; the token lives in the `push_token`
//! field. A missing key means the user does not exist.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use pushgate_common::error::AppError;
use pushgate_common::types::UserRecord;

use super::UserRecordStore;

const TOKEN_FIELD: &str = "push_token";

/// Blanks the token only when the hash still exists, so clearing never
/// resurrects a deleted user and never removes the hash itself.
const CLEAR_TOKEN_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return redis.call('HSET', KEYS[1], ARGV[1], '')
end
return 0
"#;

#[derive(Clone)]
pub struct RedisUserStore {
    conn: ConnectionManager,
    clear_script: redis::Script,
}

impl RedisUserStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            clear_script: redis::Script::new(CLEAR_TOKEN_SCRIPT),
        }
    }

    fn key(id: &str) -> String {
        format!("user:{}", id)
    }
}

#[async_trait]
impl UserRecordStore for RedisUserStore {
    async fn get(&self, id: &str) -> Result<Option<UserRecord>, AppError> {
        let mut conn = self.conn.clone();
        let mut fields: HashMap<String, String> = conn.hgetall(Self::key(id)).await?;

        if fields.is_empty() {
            return Ok(None);
        }

        Ok(Some(UserRecord {
            id: id.to_string(),
            push_token: fields.remove(TOKEN_FIELD),
        }))
    }

    async fn clear_token(&self, id: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let updated: i64 = self
            .clear_script
            .key(Self::key(id))
            .arg(TOKEN_FIELD)
            .invoke_async(&mut conn)
            .await?;

        tracing::debug!(recipient_id = %id, updated, "Push token cleared");
        Ok(())
    }
}
