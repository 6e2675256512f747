//! Batch dispatch: one multicast send to every recipient that has a token.
//!
//! Unlike single sends, tokens the transport rejects are not cleared here;
//! the multicast result only carries aggregate counts.

use futures::future::join_all;

use pushgate_common::error::AppError;
use pushgate_common::types::{
    BatchResponse, CallerContext, DeliveryOutcome, OutcomeReason, UserRecord,
};

use crate::dispatcher::NotificationDispatcher;
use crate::payload::PushMessage;
use crate::validation::{BatchParams, require_authenticated};

/// Tokens to send to, plus the recipients that were skipped.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Partition {
    pub tokens: Vec<String>,
    pub skipped: Vec<DeliveryOutcome>,
}

/// Split looked-up records into deliverable tokens and no-token outcomes.
///
/// `records[i]` must be the lookup result for `recipient_ids[i]`; both
/// output lists keep that order.
pub fn partition_recipients(
    recipient_ids: &[String],
    records: Vec<Option<UserRecord>>,
) -> Partition {
    let mut partition = Partition::default();

    for (recipient_id, record) in recipient_ids.iter().zip(records) {
        match record.as_ref().and_then(|r| r.deliverable_token()) {
            Some(token) => partition.tokens.push(token.to_string()),
            None => partition
                .skipped
                .push(DeliveryOutcome::undelivered(recipient_id, OutcomeReason::NoToken)),
        }
    }

    partition
}

impl NotificationDispatcher {
    /// Send one notification to many recipients.
    ///
    /// All lookups run concurrently and are awaited together before anything
    /// is sent. If nobody has a token the transport is never called.
    pub async fn send_batch(
        &self,
        caller: &CallerContext,
        params: &BatchParams,
    ) -> Result<BatchResponse, AppError> {
        require_authenticated(caller, "User must be authenticated")?;
        let request = params.validate()?;
        let sender = caller.uid().unwrap_or_default();

        let lookups = request
            .recipient_ids
            .iter()
            .map(|id| self.store.get(id.as_str()));
        let records = join_all(lookups)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                tracing::error!(error = %e, "Error resolving batch recipients");
                AppError::Internal(e.message())
            })?;

        let partition = partition_recipients(&request.recipient_ids, records);

        if !partition.skipped.is_empty() {
            tracing::debug!(
                skipped = partition.skipped.len(),
                recipients = ?partition
                    .skipped
                    .iter()
                    .map(|o| o.recipient_id.as_str())
                    .collect::<Vec<_>>(),
                "Recipients without FCM token"
            );
        }

        if partition.tokens.is_empty() {
            tracing::info!(
                recipients = request.recipient_ids.len(),
                "No valid FCM tokens in batch"
            );
            return Ok(BatchResponse::nothing_to_send());
        }

        let message = PushMessage::new(request.content, request.data);

        let summary = self
            .transport
            .send_many(&partition.tokens, &message)
            .await
            .map_err(|e| {
                tracing::error!(sender, error = %e, "Error sending batch notifications");
                AppError::Internal(e.to_string())
            })?;

        tracing::info!(
            sender,
            success_count = summary.success_count,
            failure_count = summary.failure_count,
            "Batch notifications sent"
        );

        Ok(BatchResponse::sent(
            summary.success_count,
            summary.failure_count,
        ))
    }
}
