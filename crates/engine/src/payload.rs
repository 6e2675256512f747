//! Push payload construction.
//!
//! Every push carries the visible notification, a string data map and the
//! same platform delivery hints: high priority with the default sound and
//! channel on Android, the default sound plus a badge on iOS.

use serde::Serialize;

use pushgate_common::types::{NotificationContent, NotificationData};

pub const ANDROID_PRIORITY: &str = "high";
pub const DEFAULT_SOUND: &str = "default";
pub const DEFAULT_CHANNEL_ID: &str = "default";
pub const BADGE_INCREMENT: u32 = 1;

/// A transport-agnostic push message (everything except the target token).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub notification: NotificationContent,
    pub data: NotificationData,
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
}

impl PushMessage {
    /// Build a message with the standard delivery hints.
    pub fn new(notification: NotificationContent, data: Option<NotificationData>) -> Self {
        Self {
            notification,
            data: data.unwrap_or_default(),
            android: AndroidConfig::default(),
            apns: ApnsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AndroidConfig {
    pub priority: &'static str,
    pub notification: AndroidNotification,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            priority: ANDROID_PRIORITY,
            notification: AndroidNotification {
                sound: DEFAULT_SOUND.to_string(),
                channel_id: DEFAULT_CHANNEL_ID.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidNotification {
    pub sound: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

impl Default for ApnsConfig {
    fn default() -> Self {
        Self {
            payload: ApnsPayload {
                aps: Aps {
                    sound: DEFAULT_SOUND.to_string(),
                    badge: BADGE_INCREMENT,
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aps {
    pub sound: String,
    pub badge: u32,
}
