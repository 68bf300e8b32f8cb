//! Application configuration.
//!
//! Values come from the environment, after an optional `.env` file has been
//! loaded by the binary. Every value has a default, so an empty environment
//! is a valid configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::catalog::DEFAULT_TRENDING_LIMIT;
use crate::error::{ConfigError, ConfigResult};

/// Published CSV export of the deals spreadsheet.
pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vR0wlpo9G9uEC1Nb_EPSqwFL4fflj-GKK3PP_nF3Px0xDYZJtBcz1vcaITw2SN9JbdDmzRTA4SMZXkN/pub?output=csv";

/// How long fetched sheet text is served without refetching (one hour).
pub const DEFAULT_REVALIDATE_SECS: u64 = 3600;

/// Per-request timeout for the sheet download.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// HTTP server port.
pub const DEFAULT_PORT: u16 = 3000;

pub const ENV_SHEET_URL: &str = "DEALSHUB_SHEET_URL";
pub const ENV_REVALIDATE_SECS: &str = "DEALSHUB_REVALIDATE_SECS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "DEALSHUB_FETCH_TIMEOUT_SECS";
pub const ENV_PORT: &str = "DEALSHUB_PORT";
pub const ENV_TRENDING_LIMIT: &str = "DEALSHUB_TRENDING_LIMIT";

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub sheet_url: String,
    pub revalidate: Duration,
    pub fetch_timeout: Duration,
    pub port: u16,
    pub trending_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sheet_url: DEFAULT_SHEET_URL.to_string(),
            revalidate: Duration::from_secs(DEFAULT_REVALIDATE_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            port: DEFAULT_PORT,
            trending_limit: DEFAULT_TRENDING_LIMIT,
        }
    }
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    ///
    /// Unset or blank variables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            sheet_url: get(ENV_SHEET_URL).unwrap_or(defaults.sheet_url),
            revalidate: parse_var::<u64>(ENV_REVALIDATE_SECS, get(ENV_REVALIDATE_SECS))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.revalidate),
            fetch_timeout: parse_var::<u64>(ENV_FETCH_TIMEOUT_SECS, get(ENV_FETCH_TIMEOUT_SECS))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            port: parse_var(ENV_PORT, get(ENV_PORT))?.unwrap_or(defaults.port),
            trending_limit: parse_var(ENV_TRENDING_LIMIT, get(ENV_TRENDING_LIMIT))?
                .unwrap_or(defaults.trending_limit),
        })
    }

    pub fn with_sheet_url(mut self, url: impl Into<String>) -> Self {
        self.sheet_url = url.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

fn parse_var<T: FromStr>(name: &str, value: Option<String>) -> ConfigResult<Option<T>> {
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
                name: name.to_string(),
                value: v,
            })
        })
        .transpose()
}
