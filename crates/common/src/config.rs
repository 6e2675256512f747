use std::net::SocketAddr;
use std::str::FromStr;

use serde::Deserialize;

/// Which backend holds the user records (and their push tokens).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStoreBackend {
    Postgres,
    Redis,
}

impl FromStr for UserStoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(UserStoreBackend::Postgres),
            "redis" => Ok(UserStoreBackend::Redis),
            other => Err(anyhow::anyhow!(
                "USER_STORE must be 'postgres' or 'redis', got '{}'",
                other
            )),
        }
    }
}

impl std::fmt::Display for UserStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStoreBackend::Postgres => write!(f, "postgres"),
            UserStoreBackend::Redis => write!(f, "redis"),
        }
    }
}

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address the API server binds to (default: 0.0.0.0:3000)
    pub bind_addr: SocketAddr,

    /// Backend holding user records
    pub user_store: UserStoreBackend,

    /// PostgreSQL connection string (required for the postgres backend)
    pub database_url: Option<String>,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// Redis connection string
    pub redis_url: String,

    /// JWT secret for caller authentication
    pub jwt_secret: String,

    /// Firebase project that owns the FCM sender
    pub fcm_project_id: String,

    /// FCM API base URL (overridable for emulators and tests)
    pub fcm_endpoint: String,

    /// Path to a Google service-account JSON key
    pub fcm_credentials_path: Option<String>,

    /// Static OAuth2 bearer token, used instead of a service account when set
    pub fcm_access_token: Option<String>,

    /// HTTP timeout for FCM requests in seconds
    pub fcm_timeout_secs: u64,

    /// Maximum accepted request body size in bytes
    pub request_body_limit_bytes: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let user_store: UserStoreBackend = env_or("USER_STORE", "postgres")?;
        let database_url = std::env::var("DATABASE_URL").ok();
        if user_store == UserStoreBackend::Postgres && database_url.is_none() {
            return Err(anyhow::anyhow!(
                "DATABASE_URL environment variable is required when USER_STORE=postgres"
            ));
        }

        let fcm_credentials_path = std::env::var("GOOGLE_APPLICATION_CREDENTIALS").ok();
        let fcm_access_token = std::env::var("FCM_ACCESS_TOKEN").ok();
        if fcm_credentials_path.is_none() && fcm_access_token.is_none() {
            return Err(anyhow::anyhow!(
                "Either GOOGLE_APPLICATION_CREDENTIALS or FCM_ACCESS_TOKEN must be set"
            ));
        }

        Ok(Self {
            bind_addr: env_or("API_BIND_ADDR", "0.0.0.0:3000")?,
            user_store,
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", "20")?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            jwt_secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?,
            fcm_project_id: std::env::var("FCM_PROJECT_ID")
                .map_err(|_| anyhow::anyhow!("FCM_PROJECT_ID environment variable is required"))?,
            fcm_endpoint: std::env::var("FCM_ENDPOINT")
                .unwrap_or_else(|_| "https://fcm.googleapis.com".to_string()),
            fcm_credentials_path,
            fcm_access_token,
            fcm_timeout_secs: env_or("FCM_TIMEOUT_SECS", "10")?,
            request_body_limit_bytes: env_or("REQUEST_BODY_LIMIT_BYTES", "65536")?,
        })
    }
}

/// Read `name` from the environment (falling back to `default`) and parse it.
fn env_or<T>(name: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    parse_value(name, &raw)
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> anyhow::Result<T> {
    raw.parse()
        .map_err(|_| anyhow::anyhow!("{} has an invalid value: '{}'", name, raw))
}
