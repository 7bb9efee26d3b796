use std::time::Duration;

use anyhow::{Context, Result};

use crate::recommendation::poller::PollConfig;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Client configuration loaded from environment variables.
/// Every value has a default; malformed numbers fail at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub poll_interval_ms: u64,
    pub poll_max_attempts: u32,
    pub http_timeout_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_url: std::env::var("PORTAL_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            poll_interval_ms: parse_env("POLL_INTERVAL_MS", 2000)?,
            poll_max_attempts: parse_env("POLL_MAX_ATTEMPTS", 60)?,
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", 30)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.poll_max_attempts,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .ok()
            .with_context(|| format!("Environment variable '{key}' must be a number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
