//! Environment configuration.

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host (`PLATEMATCH_HOST`, default 0.0.0.0)
    pub host: String,
    /// Bind port (`PLATEMATCH_PORT`, default 8765)
    pub port: u16,
    /// HS256 secret for credential verification (`PLATEMATCH_JWT_SECRET`)
    pub jwt_secret: String,
    /// Liveness probe interval in seconds (`PLATEMATCH_PING_INTERVAL_SECS`,
    /// default 30). A connection that leaves a probe unanswered for a full
    /// interval is reaped through the normal disconnect path.
    pub ping_interval_secs: u64,
    /// Status reporter interval in seconds
    /// (`PLATEMATCH_STATUS_INTERVAL_SECS`, default 60)
    pub status_interval_secs: u64,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("PLATEMATCH_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parsed("PLATEMATCH_PORT", 8765),
            jwt_secret: env::var("PLATEMATCH_JWT_SECRET").unwrap_or_else(|_| {
                warn!("PLATEMATCH_JWT_SECRET not set - using development secret");
                "dev-secret-change-me".to_string()
            }),
            ping_interval_secs: env_parsed("PLATEMATCH_PING_INTERVAL_SECS", 30),
            status_interval_secs: env_parsed("PLATEMATCH_STATUS_INTERVAL_SECS", 60),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
