//! Portal configuration from environment variables.

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `MRP_SESSION_TTL_MINS` was set but is not a positive integer.
    #[error("Invalid MRP_SESSION_TTL_MINS value: {0}")]
    InvalidSessionTtl(String),
}

/// Runtime configuration for the portal.
///
/// # Environment Variables
/// - `MRP_ADDR`: bind address (default: "0.0.0.0:3000")
/// - `MRP_UPSTREAM_URL`: base URL of the analysis service
///   (default: "http://127.0.0.1:8000"); a trailing slash is stripped
/// - `MRP_SESSION_TTL_MINS`: result-slot inactivity TTL in minutes
///   (default: 60)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: String,
    pub upstream_url: String,
    pub session_ttl_mins: i64,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = std::env::var("MRP_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
        let upstream_url = std::env::var("MRP_UPSTREAM_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".into())
            .trim_end_matches('/')
            .to_string();
        let session_ttl_mins = match std::env::var("MRP_SESSION_TTL_MINS") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|mins| *mins > 0)
                .ok_or(ConfigError::InvalidSessionTtl(raw))?,
            Err(_) => 60,
        };
        Ok(Self {
            addr,
            upstream_url,
            session_ttl_mins,
        })
    }
}
