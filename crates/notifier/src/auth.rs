//! OAuth2 access tokens for the FCM API.
//!
//! Service-account flow: sign a short-lived RS256 assertion with the key's
//! private key, exchange it at the key's `token_uri` for an access token,
//! and reuse that token until shortly before it expires.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::NotifierError;

/// OAuth2 scope required to send FCM messages.
pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each signed assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh this long before the cached token expires.
const REFRESH_MARGIN_SECS: i64 = 60;

/// The parts of a Google service-account JSON key that we use.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NotifierError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, NotifierError> {
        serde_json::from_str(raw).map_err(|e| NotifierError::Credentials(e.to_string()))
    }
}

/// Claims of the assertion sent to the token endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Cache entry for a token valid for `expires_in` seconds from `now`.
    fn expiring_in(
        access_token: String,
        now: DateTime<Utc>,
        expires_in: i64,
    ) -> Result<Self, NotifierError> {
        let expires_at = Duration::try_seconds(expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                NotifierError::TokenExchange(format!("expires_in out of range: {}", expires_in))
            })?;
        Ok(Self {
            access_token,
            expires_at,
        })
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Mints and caches access tokens from a service-account key.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    http: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Result<Self, NotifierError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| NotifierError::Credentials(format!("private_key: {}", e)))?;

        Ok(Self {
            key,
            signing_key,
            http,
            cached: RwLock::new(None),
        })
    }

    /// Build and sign the token-endpoint assertion.
    pub fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, NotifierError> {
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        Ok(encode(&header, &claims, &self.signing_key)?)
    }

    /// Return a valid access token, exchanging a new assertion when needed.
    pub async fn access_token(&self) -> Result<String, NotifierError> {
        if let Some(token) = self.cached.read().await.as_ref()
            && token.is_fresh(Utc::now())
        {
            return Ok(token.access_token.clone());
        }

        let mut cached = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref()
            && token.is_fresh(Utc::now())
        {
            return Ok(token.access_token.clone());
        }

        let token = self.exchange().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn exchange(&self) -> Result<CachedToken, NotifierError> {
        let now = Utc::now();
        let assertion = self.signed_assertion(now)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::TokenExchange(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "Obtained FCM access token"
        );

        CachedToken::expiring_in(token.access_token, now, token.expires_in)
    }
}

/// Where the FCM client gets its bearer token from.
pub enum AccessTokenSource {
    /// A fixed token (emulators, or tokens managed outside this process).
    Static(String),
    ServiceAccount(Box<ServiceAccountAuth>),
}

impl AccessTokenSource {
    pub async fn access_token(&self) -> Result<String, NotifierError> {
        match self {
            AccessTokenSource::Static(token) => Ok(token.clone()),
            AccessTokenSource::ServiceAccount(auth) => auth.access_token().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "svc@example.iam.gserviceaccount.com", "private_key": "pem"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(key.private_key_id, None);
    }

    #[test]
    fn test_key_missing_fields_rejected() {
        let err = ServiceAccountKey::from_json(r#"{"client_email": "svc@example.com"}"#)
            .unwrap_err();
        assert!(matches!(err, NotifierError::Credentials(_)));
    }

    #[test]
    fn test_invalid_pem_rejected() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "svc@example.com", "private_key": "not a pem"}"#,
        )
        .unwrap();
        let result = ServiceAccountAuth::new(key, reqwest::Client::new());
        assert!(matches!(result, Err(NotifierError::Credentials(_))));
    }

    #[test]
    fn test_cached_token_freshness() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "ya29.token".into(),
            expires_at: now + Duration::seconds(3599),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::seconds(3550)));
    }

    #[test]
    fn test_out_of_range_expiry_rejected() {
        let now = Utc::now();
        let token = CachedToken::expiring_in("ya29.token".into(), now, 3599).unwrap();
        assert_eq!(token.expires_at, now + Duration::seconds(3599));

        let err = CachedToken::expiring_in("ya29.token".into(), now, i64::MAX).unwrap_err();
        assert!(matches!(err, NotifierError::TokenExchange(_)));
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = AccessTokenSource::Static("emulator-token".into());
        assert_eq!(source.access_token().await.unwrap(), "emulator-token");
    }
}
