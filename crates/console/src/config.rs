use std::time::Duration;

use polyadmin_core::error::CoreError;
use polyadmin_core::validation::{
    NameRules, DEFAULT_ADAPTER_NAME_PATTERN, DEFAULT_TABLE_NAME_PATTERN,
};
use polyadmin_workflow::PollerConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got `{value}`")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error(transparent)]
    Pattern(#[from] CoreError),
}

/// Console configuration loaded from environment variables.
///
/// Every field has a default suitable for a backend running locally.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the backend HTTP API.
    pub http_url: String,
    /// WebSocket endpoint of the live channel.
    pub ws_url: String,
    pub adapter_name_pattern: String,
    pub table_name_pattern: String,
    /// Milliseconds between cache-status polls (default: `1000`).
    pub cache_poll_interval_ms: u64,
    /// Consecutive failed polls before polling stops (default: `30`).
    pub cache_poll_max_failures: u32,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl ConsoleConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                      |
    /// |---------------------------|------------------------------|
    /// | `POLYADMIN_HTTP_URL`      | `http://localhost:7659`      |
    /// | `POLYADMIN_WS_URL`        | `ws://localhost:7659/webSocket` |
    /// | `ADAPTER_NAME_PATTERN`    | `[a-z_][a-z0-9_]{0,100}`     |
    /// | `TABLE_NAME_PATTERN`      | `[a-zA-Z_][a-zA-Z0-9_]{0,100}` |
    /// | `CACHE_POLL_INTERVAL_MS`  | `1000`                       |
    /// | `CACHE_POLL_MAX_FAILURES` | `30`                         |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                         |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |var: &str, default: &str| lookup(var).unwrap_or_else(|| default.into());

        let config = Self {
            http_url: text("POLYADMIN_HTTP_URL", "http://localhost:7659"),
            ws_url: text("POLYADMIN_WS_URL", "ws://localhost:7659/webSocket"),
            adapter_name_pattern: text("ADAPTER_NAME_PATTERN", DEFAULT_ADAPTER_NAME_PATTERN),
            table_name_pattern: text("TABLE_NAME_PATTERN", DEFAULT_TABLE_NAME_PATTERN),
            cache_poll_interval_ms: number(&lookup, "CACHE_POLL_INTERVAL_MS", 1000)?,
            cache_poll_max_failures: number(&lookup, "CACHE_POLL_MAX_FAILURES", 30)?,
            request_timeout_secs: number(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
        };

        // fail at startup rather than at the first validation
        config.name_rules()?;
        Ok(config)
    }

    pub fn name_rules(&self) -> Result<NameRules, CoreError> {
        NameRules::new(&self.adapter_name_pattern, &self.table_name_pattern)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(self.cache_poll_interval_ms),
            max_failures: self.cache_poll_max_failures,
            ..Default::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn number<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    let Some(value) = lookup(var) else {
        return Ok(default);
    };
    match value.trim().parse::<T>() {
        Ok(n) if n > T::from(0u8) => Ok(n),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a positive integer",
            value,
        }),
    }
}
