//! Firebase Cloud Messaging delivery.
//!
//! `FcmTransport` implements the engine's `PushTransport` over the FCM HTTP
//! v1 API. Requests are authorized with an OAuth2 access token that is
//! either supplied directly or minted from a Google service-account key.

pub mod auth;
pub mod error;
pub mod fcm;

pub use auth::{AccessTokenSource, ServiceAccountKey};
pub use error::NotifierError;
pub use fcm::FcmTransport;
