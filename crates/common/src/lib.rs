//! Shared building blocks for the Pushgate services: configuration, the
//! error taxonomy, domain types and connection helpers.

pub mod config;
pub mod db;
pub mod error;
pub mod redis_pool;
pub mod types;
