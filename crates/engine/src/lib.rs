//! Dispatch core: resolves push tokens from the user-record store and hands
//! notifications to a push transport.

pub mod batch;
pub mod dispatcher;
pub mod payload;
pub mod store;
pub mod transport;
pub mod validation;

pub use dispatcher::NotificationDispatcher;
