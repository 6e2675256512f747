//! Inbound request parameters and their validation.
//!
//! Parameters arrive loosely typed (every field optional) so that missing
//! fields surface as `InvalidArgument` rather than as a decode failure.

use serde::Deserialize;

use pushgate_common::error::AppError;
use pushgate_common::types::{CallerContext, NotificationContent, NotificationData};

/// Parameters for a single-recipient send.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendParams {
    pub recipient_id: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub notification_data: Option<NotificationData>,
}

/// Parameters for a batch send.
///
/// `recipient_ids` stays raw JSON so that "not a list" can be reported as
/// an invalid argument.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchParams {
    pub recipient_ids: Option<serde_json::Value>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub notification_data: Option<NotificationData>,
}

/// A send request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub recipient_id: String,
    pub content: NotificationContent,
    pub data: Option<NotificationData>,
}

/// A batch request that passed validation. `recipient_ids` keeps input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub recipient_ids: Vec<String>,
    pub content: NotificationContent,
    pub data: Option<NotificationData>,
}

/// Reject anonymous callers.
pub fn require_authenticated(caller: &CallerContext, message: &str) -> Result<(), AppError> {
    if caller.is_authenticated() {
        Ok(())
    } else {
        Err(AppError::Unauthenticated(message.to_string()))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl SendParams {
    pub fn validate(&self) -> Result<SendRequest, AppError> {
        match (
            non_empty(&self.recipient_id),
            non_empty(&self.title),
            non_empty(&self.body),
        ) {
            (Some(recipient_id), Some(title), Some(body)) => Ok(SendRequest {
                recipient_id: recipient_id.to_string(),
                content: NotificationContent {
                    title: title.to_string(),
                    body: body.to_string(),
                },
                data: self.notification_data.clone(),
            }),
            _ => Err(AppError::InvalidArgument(
                "Missing required fields: recipientId, title, body".to_string(),
            )),
        }
    }
}

impl BatchParams {
    pub fn validate(&self) -> Result<BatchRequest, AppError> {
        let recipient_ids = self
            .recipient_ids
            .as_ref()
            .and_then(|v| v.as_array())
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| {
                AppError::InvalidArgument("recipientIds must be a non-empty array".to_string())
            })?;

        let recipient_ids = recipient_ids
            .iter()
            .map(|id| match id.as_str() {
                Some(id) if !id.is_empty() => Ok(id.to_string()),
                _ => Err(AppError::InvalidArgument(
                    "recipientIds must contain only non-empty strings".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (Some(title), Some(body)) = (non_empty(&self.title), non_empty(&self.body)) else {
            return Err(AppError::InvalidArgument(
                "Missing required fields: title, body".to_string(),
            ));
        };

        Ok(BatchRequest {
            recipient_ids,
            content: NotificationContent {
                title: title.to_string(),
                body: body.to_string(),
            },
            data: self.notification_data.clone(),
        })
    }
}
