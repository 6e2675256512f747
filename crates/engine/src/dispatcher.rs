//! Single-recipient dispatch.
//!
//! Flow for one call:
//! 1. Reject anonymous callers and malformed parameters
//! 2. Look up the recipient's push token
//! 3. Send through the transport
//! 4. Clear the token if the transport says it is dead

use std::sync::Arc;

use pushgate_common::error::AppError;
use pushgate_common::types::{CallerContext, OutcomeReason, SendResponse};

use crate::payload::PushMessage;
use crate::store::UserRecordStore;
use crate::transport::PushTransport;
use crate::validation::{SendParams, require_authenticated};

/// Resolves recipients to push tokens and sends through a transport.
///
/// Holds no per-call state; a single instance serves every request.
#[derive(Clone)]
pub struct NotificationDispatcher {
    pub(crate) store: Arc<dyn UserRecordStore>,
    pub(crate) transport: Arc<dyn PushTransport>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn UserRecordStore>, transport: Arc<dyn PushTransport>) -> Self {
        Self { store, transport }
    }

    /// Send one notification to one recipient.
    ///
    /// Missing users and missing tokens are reported as `success: false`,
    /// not as errors. A token the transport rejects as invalid or
    /// unregistered is cleared from the user record before returning.
    pub async fn send(
        &self,
        caller: &CallerContext,
        params: &SendParams,
    ) -> Result<SendResponse, AppError> {
        require_authenticated(caller, "User must be authenticated to send notifications")?;
        let request = params.validate()?;
        let recipient_id = request.recipient_id.as_str();
        let sender = caller.uid().unwrap_or_default();

        let Some(record) = self.store.get(recipient_id).await? else {
            tracing::info!(recipient_id, "User not found");
            return Ok(SendResponse::undelivered(OutcomeReason::UserNotFound));
        };

        let Some(token) = record.deliverable_token() else {
            tracing::info!(recipient_id, "No FCM token for user");
            return Ok(SendResponse::undelivered(OutcomeReason::NoToken));
        };

        let message = PushMessage::new(request.content, request.data);

        match self.transport.send_one(token, &message).await {
            Ok(message_id) => {
                tracing::info!(
                    sender,
                    recipient_id,
                    message_id = %message_id,
                    "Notification sent"
                );
                Ok(SendResponse::delivered(message_id))
            }
            Err(err) if err.is_dead_token() => {
                tracing::warn!(
                    sender,
                    recipient_id,
                    error = %err,
                    "Token rejected by transport, clearing it"
                );
                self.store.clear_token(recipient_id).await?;
                Ok(SendResponse::undelivered(OutcomeReason::InvalidToken))
            }
            Err(err) => {
                tracing::error!(sender, recipient_id, error = %err, "Error sending notification");
                Err(AppError::Internal(err.to_string()))
            }
        }
    }
}
