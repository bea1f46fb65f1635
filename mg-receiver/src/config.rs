//! Configuration module for environment variable parsing.
//!
//! Process settings come from environment variables. Per-recipient templates
//! live in a separate YAML file, see [`crate::recipients`].

use std::env;
use tracing::warn;

use crate::{Error, Result};

/// Default Mailgun API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.mailgun.net/v3";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Mailgun API key, used both as the webhook signing key and for API calls
    pub api_key: String,

    /// Path of the dedup store database file
    pub db_path: String,

    /// Path of the YAML recipients file
    pub config_path: String,

    /// Base URL of the Mailgun API
    pub api_base: String,

    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Maximum age in seconds for webhook timestamps (0 disables the check)
    pub signature_max_age: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: parse_or("PORT", 9898),

            api_key: env::var("MAILGUN_API_KEY").unwrap_or_default(),

            db_path: env::var("DB_PATH").unwrap_or_else(|_| "mg.db".to_string()),

            config_path: env::var("CONFIG_PATH").unwrap_or_else(|_| "mg.yml".to_string()),

            api_base: env::var("MAILGUN_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),

            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", 8000),

            signature_max_age: parse_or("MAILGUN_SIGNATURE_MAX_AGE", 0),
        }
    }

    /// Reject settings the receiver cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config("MAILGUN_API_KEY must be set".to_string()));
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(Error::Config(format!(
                "MAILGUN_API_BASE must be an http(s) URL, got {}",
                self.api_base
            )));
        }
        Ok(())
    }

    /// Whether webhook timestamps are checked against a replay window.
    pub fn replay_window_enabled(&self) -> bool {
        self.signature_max_age > 0
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}
