use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A user record as seen by the dispatcher.
///
/// Records are created and updated elsewhere. The dispatcher only reads the
/// token and clears it after FCM rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub push_token: Option<String>,
}

impl UserRecord {
    /// The token, if present and non-empty.
    pub fn deliverable_token(&self) -> Option<&str> {
        self.push_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Identity of whoever invoked a dispatcher.
///
/// Supplied by the host (the API's auth extractor) and otherwise opaque.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    uid: Option<String>,
}

impl CallerContext {
    pub fn anonymous() -> Self {
        Self { uid: None }
    }

    pub fn authenticated(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.uid.is_some()
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }
}

/// Visible part of a push: what the device shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

/// Free-form string data delivered alongside the notification.
pub type NotificationData = BTreeMap<String, String>;

/// Why a recipient did not get a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeReason {
    UserNotFound,
    NoToken,
    InvalidToken,
}

impl OutcomeReason {
    /// Caller-facing message for this outcome.
    pub fn message(&self) -> &'static str {
        match self {
            OutcomeReason::UserNotFound => "User not found",
            OutcomeReason::NoToken => "No FCM token",
            OutcomeReason::InvalidToken => "Invalid or expired FCM token",
        }
    }
}

impl std::fmt::Display for OutcomeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Per-recipient delivery result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub recipient_id: String,
    pub delivered: bool,
    pub reason: Option<OutcomeReason>,
}

impl DeliveryOutcome {
    pub fn undelivered(recipient_id: impl Into<String>, reason: OutcomeReason) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            delivered: false,
            reason: Some(reason),
        }
    }
}

/// Message returned when a batch has nobody to deliver to.
pub const NO_VALID_TOKENS: &str = "No valid FCM tokens found";

/// Result of a single-recipient send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendResponse {
    pub fn delivered(message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn undelivered(reason: OutcomeReason) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(reason.message().to_string()),
        }
    }
}

/// Result of a batch send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResponse {
    pub fn sent(success_count: u32, failure_count: u32) -> Self {
        Self {
            success: true,
            success_count: Some(success_count),
            failure_count: Some(failure_count),
            error: None,
        }
    }

    pub fn nothing_to_send() -> Self {
        Self {
            success: false,
            success_count: None,
            failure_count: None,
            error: Some(NO_VALID_TOKENS.to_string()),
        }
    }
}
