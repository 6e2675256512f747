//! Pushgate API server.
//!
//! Endpoints (callable protocol, see `callable`):
//! - POST /sendPushNotification — push to one recipient
//! - POST /sendBatchNotifications — push to many recipients
//! - GET  /health

pub mod callable;
pub mod middleware;
pub mod routes;
pub mod state;
