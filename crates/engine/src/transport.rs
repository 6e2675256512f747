//! Push delivery transport abstraction.

use async_trait::async_trait;
use thiserror::Error;

use crate::payload::PushMessage;

/// Why the transport refused a send.
///
/// The classification is closed: the dispatcher only distinguishes tokens
/// that are permanently dead from everything else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The token is malformed or was never issued to this sender.
    #[error("{0}")]
    InvalidToken(String),

    /// The token was valid once but the app instance has gone away.
    #[error("{0}")]
    UnregisteredToken(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// True when the token should be evicted from the user record.
    pub fn is_dead_token(&self) -> bool {
        matches!(
            self,
            TransportError::InvalidToken(_) | TransportError::UnregisteredToken(_)
        )
    }
}

/// Aggregate result of a multicast send. Failures are not itemized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MulticastSummary {
    pub success_count: u32,
    pub failure_count: u32,
}

/// A service that can deliver a push to one or many device tokens.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Send to a single token. Returns the transport's message id.
    async fn send_one(&self, token: &str, message: &PushMessage) -> Result<String, TransportError>;

    /// Send the same message to every token.
    async fn send_many(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<MulticastSummary, TransportError>;
}
