//! User-record store abstraction and its backends.

pub mod postgres;
pub mod redis_hash;

use async_trait::async_trait;

use pushgate_common::error::AppError;
use pushgate_common::types::UserRecord;

pub use self::postgres::PgUserStore;
pub use self::redis_hash::RedisUserStore;

/// Read/clear access to user records keyed by recipient id.
#[async_trait]
pub trait UserRecordStore: Send + Sync {
    /// Fetch a record. `None` means the recipient does not exist.
    async fn get(&self, id: &str) -> Result<Option<UserRecord>, AppError>;

    /// Null the record's push token. Must not create or delete the record.
    async fn clear_token(&self, id: &str) -> Result<(), AppError>;
}
