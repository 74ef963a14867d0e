//! Configuration loaded from environment variables.
//!
//! | Variable                   | Default                                              |
//! |----------------------------|------------------------------------------------------|
//! | `EXPENSE_API_URL`          | `https://67ac71475853dfff53dab929.mockapi.io/api/v1` |
//! | `EXPENSE_API_TIMEOUT_SECS` | `10`                                                 |
//! | `EXPENSE_DATA_DIR`         | `./.expense-tracker`                                 |
//! | `EXPENSE_MAX_RETRIES`      | `3`                                                  |
//! | `EXPENSE_RETRY_BASE_MS`    | `1000`                                               |
//! | `MOCK_SERVER_ADDR`         | `127.0.0.1:3000`                                     |
//! | `MOCK_RATE_LIMIT`          | `0`                                                  |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::fetch::RetryConfig;

pub const DEFAULT_API_URL: &str = "https://67ac71475853dfff53dab929.mockapi.io/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DATA_DIR: &str = "./.expense-tracker";
pub const DEFAULT_MOCK_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid API url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the expense API (path included).
    pub api_url: Url,

    /// Per-request timeout.
    pub request_timeout: Duration,

    /// Directory holding the persisted user and budget.
    pub data_dir: PathBuf,

    /// Backoff policy for listing expenses.
    pub retry: RetryConfig,

    /// Bind address of the local mock API server.
    pub mock_addr: SocketAddr,

    /// Number of initial `GET /expenses` calls the mock server answers with 429.
    pub mock_rate_limit: u32,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_url_raw = get("EXPENSE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = parse_api_url(&api_url_raw)?;

        let timeout_secs: u64 = parse_var(&get, "EXPENSE_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let defaults = RetryConfig::default();
        let max_retries = parse_var(&get, "EXPENSE_MAX_RETRIES", defaults.max_retries)?;
        let base_ms = parse_var(
            &get,
            "EXPENSE_RETRY_BASE_MS",
            defaults.base_delay.as_millis() as u64,
        )?;

        let mock_addr_raw =
            get("MOCK_SERVER_ADDR").unwrap_or_else(|| DEFAULT_MOCK_ADDR.to_string());
        let mock_addr =
            SocketAddr::from_str(mock_addr_raw.trim()).map_err(|_| ConfigError::InvalidValue {
                name: "MOCK_SERVER_ADDR",
                value: mock_addr_raw.clone(),
            })?;

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
            data_dir: get("EXPENSE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            retry: RetryConfig {
                max_retries,
                base_delay: Duration::from_millis(base_ms),
            },
            mock_addr,
            mock_rate_limit: parse_var(&get, "MOCK_RATE_LIMIT", 0)?,
        })
    }
}

fn parse_var<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(default),
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: "URL cannot carry a path".to_string(),
        });
    }
    Ok(url)
}
