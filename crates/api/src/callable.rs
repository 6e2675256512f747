//! Callable protocol envelope.
//!
//! Requests carry their arguments under `data`, successful responses wrap
//! the handler's value under `result`, and failures are rendered by
//! `AppError` as `{"error": {"status", "message"}}`.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use pushgate_common::error::AppError;

#[derive(Debug, Deserialize)]
struct CallableRequest<T> {
    #[serde(default)]
    data: T,
}

/// Successful callable response body.
#[derive(Debug, Serialize)]
pub struct CallableResponse<T> {
    pub result: T,
}

impl<T> CallableResponse<T> {
    pub fn new(result: T) -> Json<Self> {
        Json(Self { result })
    }
}

/// Extracts `data` from a callable request body.
///
/// An unreadable body is an invalid argument. A missing `data` field yields
/// `T::default()` so that field-level validation reports what is missing.
pub struct CallableData<T>(pub T);

impl<S, T> FromRequest<S> for CallableData<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(envelope) = Json::<CallableRequest<T>>::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidArgument(e.body_text()))?;
        Ok(CallableData(envelope.data))
    }
}
