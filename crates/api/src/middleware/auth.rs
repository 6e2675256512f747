//! Caller authentication.
//!
//! Provides JWT validation plus an `AuthContext` Axum extractor that
//! turns the Authorization header into a `CallerContext`. A request without
//! the header is anonymous; the dispatchers decide whether that is allowed.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use pushgate_common::error::AppError;
use pushgate_common::types::CallerContext;

use crate::state::AppState;

/// JWT claims stored in the token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject — the caller's uid
    pub sub: String,
    /// Expiration time (UNIX timestamp)
    pub exp: i64,
    /// Issued at (UNIX timestamp)
    pub iat: i64,
}

/// Identity of the caller, extracted from `Authorization: Bearer <JWT>`.
///
/// ```ignore
/// async fn handler(AuthContext(caller): AuthContext) -> impl IntoResponse {
///     // caller.is_authenticated()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthContext(pub CallerContext);

/// Decode and validate a JWT token.
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::Unauthenticated(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

/// Resolve the caller from an optional Authorization header value.
pub fn caller_from_header(header: Option<&str>, secret: &str) -> Result<CallerContext, AppError> {
    let Some(header) = header else {
        return Ok(CallerContext::anonymous());
    };

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthenticated("Authorization header must use 'Bearer <JWT>'".to_string())
    })?;

    let claims = decode_jwt(token.trim(), secret)?;
    if claims.sub.is_empty() {
        return Err(AppError::Unauthenticated(
            "Token has an empty subject".to_string(),
        ));
    }

    Ok(CallerContext::authenticated(claims.sub))
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok());

        let caller = caller_from_header(header, &state.config.jwt_secret)?;
        Ok(AuthContext(caller))
    }
}
