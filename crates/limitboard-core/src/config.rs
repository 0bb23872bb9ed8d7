use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LogFormat;
use crate::ValidationError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_WATCHLIST_PATH: &str = "stock_watchlist.json";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Client settings, usually read from `LIMITBOARD_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub login_route: String,
    pub watchlist_path: PathBuf,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            login_route: String::from(DEFAULT_LOGIN_ROUTE),
            watchlist_path: PathBuf::from(DEFAULT_WATCHLIST_PATH),
            log_level: String::from(DEFAULT_LOG_LEVEL),
            log_format: LogFormat::Pretty,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(base_url) = read("LIMITBOARD_API_BASE_URL") {
            config.base_url = base_url;
        }
        config.api_token = read("LIMITBOARD_API_TOKEN");
        if let Some(raw) = read("LIMITBOARD_TIMEOUT_SECS") {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ValidationError::InvalidConfig {
                    key: "LIMITBOARD_TIMEOUT_SECS",
                    value: raw,
                })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(route) = read("LIMITBOARD_LOGIN_ROUTE") {
            config.login_route = route;
        }
        if let Some(path) = read("LIMITBOARD_WATCHLIST_PATH") {
            config.watchlist_path = PathBuf::from(path);
        }
        if let Some(level) = read("LIMITBOARD_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(format) = read("LIMITBOARD_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn with_watchlist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.watchlist_path = path.into();
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}
