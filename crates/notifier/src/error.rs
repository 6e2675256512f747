use thiserror::Error;

/// Failures setting up or authorizing the FCM client.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to read credentials: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid service account key: {0}")]
    Credentials(String),

    #[error("Failed to sign token assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
}
