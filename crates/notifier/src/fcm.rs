//! FCM HTTP v1 transport.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use pushgate_common::config::AppConfig;
use pushgate_engine::payload::PushMessage;
use pushgate_engine::transport::{MulticastSummary, PushTransport, TransportError};

use crate::auth::{AccessTokenSource, ServiceAccountAuth, ServiceAccountKey};
use crate::error::NotifierError;

/// Largest token list a multicast send accepts.
pub const MAX_MULTICAST_TOKENS: usize = 500;

#[derive(Serialize)]
struct SendRequest<'a> {
    message: TargetedMessage<'a>,
}

#[derive(Serialize)]
struct TargetedMessage<'a> {
    token: &'a str,
    #[serde(flatten)]
    message: &'a PushMessage,
}

#[derive(Deserialize)]
struct SendResponseBody {
    name: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
}

/// Map an FCM error response onto the transport's error classification.
///
/// The FCM-specific `errorCode` in `details` wins over the generic
/// `status`. `UNREGISTERED` and plain 404s mean the app instance is gone;
/// an `INVALID_ARGUMENT` that names the registration token means the token
/// itself is malformed. Everything else is unclassified.
pub fn classify_error(status: StatusCode, body: &str) -> TransportError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return TransportError::Other(format!("FCM returned {}: {}", status, body.trim()));
    };
    let error = envelope.error;

    let code = error
        .details
        .iter()
        .find_map(|d| d.error_code.as_deref())
        .or(error.status.as_deref())
        .unwrap_or_default();

    match code {
        "UNREGISTERED" => TransportError::UnregisteredToken(error.message),
        "INVALID_ARGUMENT" if names_registration_token(&error.message) => {
            TransportError::InvalidToken(error.message)
        }
        _ if status == StatusCode::NOT_FOUND => TransportError::UnregisteredToken(error.message),
        _ if error.message.is_empty() => TransportError::Other(format!("FCM returned {}", status)),
        _ => TransportError::Other(error.message),
    }
}

fn names_registration_token(message: &str) -> bool {
    message.to_ascii_lowercase().contains("registration token")
}

/// Sends pushes through `POST /v1/projects/{project}/messages:send`.
pub struct FcmTransport {
    http: reqwest::Client,
    send_url: String,
    auth: AccessTokenSource,
}

impl FcmTransport {
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        project_id: &str,
        auth: AccessTokenSource,
    ) -> Self {
        let send_url = format!(
            "{}/v1/projects/{}/messages:send",
            endpoint.trim_end_matches('/'),
            project_id
        );
        Self {
            http,
            send_url,
            auth,
        }
    }

    /// Build a transport from application config.
    ///
    /// A static `FCM_ACCESS_TOKEN` takes precedence over a service-account key.
    pub fn from_config(config: &AppConfig) -> Result<Self, NotifierError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fcm_timeout_secs))
            .build()?;

        let auth = match (&config.fcm_access_token, &config.fcm_credentials_path) {
            (Some(token), _) => AccessTokenSource::Static(token.clone()),
            (None, Some(path)) => {
                let key = ServiceAccountKey::from_file(path)?;
                AccessTokenSource::ServiceAccount(Box::new(ServiceAccountAuth::new(
                    key,
                    http.clone(),
                )?))
            }
            (None, None) => {
                return Err(NotifierError::Credentials(
                    "no FCM access token or service account configured".to_string(),
                ));
            }
        };

        tracing::info!(
            project_id = %config.fcm_project_id,
            endpoint = %config.fcm_endpoint,
            "FCM transport configured"
        );

        Ok(Self::new(
            http,
            &config.fcm_endpoint,
            &config.fcm_project_id,
            auth,
        ))
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }
}

#[async_trait]
impl PushTransport for FcmTransport {
    async fn send_one(&self, token: &str, message: &PushMessage) -> Result<String, TransportError> {
        let access_token = self
            .auth
            .access_token()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;

        let request = SendRequest {
            message: TargetedMessage { token, message },
        };

        let response = self
            .http
            .post(&self.send_url)
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::Other(format!("FCM request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let body: SendResponseBody = response
                .json()
                .await
                .map_err(|e| TransportError::Other(format!("Invalid FCM response: {}", e)))?;
            return Ok(body.name);
        }

        let body = response.text().await.unwrap_or_default();
        let err = classify_error(status, &body);
        tracing::debug!(status = %status, error = %err, "FCM rejected message");
        Err(err)
    }

    /// One request per token, all in flight together.
    async fn send_many(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<MulticastSummary, TransportError> {
        if tokens.is_empty() {
            return Err(TransportError::Other(
                "tokens must be a non-empty array".to_string(),
            ));
        }
        if tokens.len() > MAX_MULTICAST_TOKENS {
            return Err(TransportError::Other(format!(
                "tokens list must not contain more than {} items",
                MAX_MULTICAST_TOKENS
            )));
        }

        let results = join_all(tokens.iter().map(|t| self.send_one(t, message))).await;

        let mut summary = MulticastSummary::default();
        for result in results {
            match result {
                Ok(_) => summary.success_count += 1,
                Err(err) => {
                    tracing::debug!(error = %err, "Multicast delivery failed for one token");
                    summary.failure_count += 1;
                }
            }
        }

        Ok(summary)
    }
}
