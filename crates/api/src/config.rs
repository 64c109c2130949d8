//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `WEBHOOK_SECRET` — shared secret for webhook signatures
/// - `ADMIN_KEY` — key for the `/admin` routes
/// - `CHECKOUT_TIMEOUT_MS` — checkout budget (default: `10000`)
/// - `TOKEN_TTL_SECS` — ephemeral token lifetime (default: `900`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub webhook_secret: String,
    pub admin_key: String,
    pub checkout_timeout: Duration,
    pub token_ttl: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            webhook_secret: std::env::var("WEBHOOK_SECRET").unwrap_or(defaults.webhook_secret),
            admin_key: std::env::var("ADMIN_KEY").unwrap_or(defaults.admin_key),
            checkout_timeout: std::env::var("CHECKOUT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.checkout_timeout),
            token_ttl: std::env::var("TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.token_ttl),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            webhook_secret: "whsec_dev_only".to_string(),
            admin_key: "admin_dev_only".to_string(),
            checkout_timeout: Duration::from_millis(10_000),
            token_ttl: Duration::from_secs(900),
        }
    }
}
