pub mod health;
pub mod notifications;

use axum::Router;
use axum::extract::DefaultBodyLimit;

use crate::state::AppState;

/// Build the complete API router with all routes.
///
/// Oversized bodies surface as a `Json` rejection inside `CallableData`, so
/// they are reported in the callable error envelope like any other bad input.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.request_body_limit_bytes;
    Router::new()
        .merge(health::router())
        .merge(notifications::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
