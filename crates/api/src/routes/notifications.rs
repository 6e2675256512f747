//! Push notification routes.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use pushgate_common::error::AppError;
use pushgate_common::types::{BatchResponse, SendResponse};
use pushgate_engine::validation::{BatchParams, SendParams};

use crate::callable::{CallableData, CallableResponse};
use crate::middleware::auth::AuthContext;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sendPushNotification", post(send_push_notification))
        .route("/sendBatchNotifications", post(send_batch_notifications))
}

/// POST /sendPushNotification — Push to a single recipient.
async fn send_push_notification(
    State(state): State<AppState>,
    AuthContext(caller): AuthContext,
    CallableData(params): CallableData<SendParams>,
) -> Result<Json<CallableResponse<SendResponse>>, AppError> {
    let result = state.dispatcher.send(&caller, &params).await?;
    Ok(CallableResponse::new(result))
}

/// POST /sendBatchNotifications — Push the same message to many recipients.
async fn send_batch_notifications(
    State(state): State<AppState>,
    AuthContext(caller): AuthContext,
    CallableData(params): CallableData<BatchParams>,
) -> Result<Json<CallableResponse<BatchResponse>>, AppError> {
    let result = state.dispatcher.send_batch(&caller, &params).await?;
    Ok(CallableResponse::new(result))
}
