//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;
use std::time::Duration;

use crate::state::session::RestorePolicy;

pub const DEFAULT_AUTH_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_AUTH_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUTH_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_STORE_PATH: &str = ".portal/session.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid AUTH_API_BASE_URL: {0}")]
    InvalidBaseUrl(String),

    #[error("unknown SESSION_RESTORE_POLICY '{0}' (expected 'trust' or 'reject_expired')")]
    UnknownRestorePolicy(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTimeouts {
    pub request: Duration,
    pub connect: Duration,
}

impl Default for AuthTimeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(DEFAULT_AUTH_REQUEST_TIMEOUT_SECS),
            connect: Duration::from_secs(DEFAULT_AUTH_CONNECT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub timeouts: AuthTimeouts,
    pub store_path: PathBuf,
    pub restore_policy: RestorePolicy,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `AUTH_API_BASE_URL`: default `http://localhost:8000`
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 30
    /// - `AUTH_CONNECT_TIMEOUT_SECS`: default 10
    /// - `SESSION_STORE_PATH`: default `.portal/session.json`
    /// - `SESSION_RESTORE_POLICY`: `trust` (default) or `reject_expired`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not `http(s)://` or the restore
    /// policy is unknown.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = parse_base_url(lookup("AUTH_API_BASE_URL").as_deref())?;
        let timeouts = AuthTimeouts {
            request: Duration::from_secs(parse_u64(
                lookup("AUTH_REQUEST_TIMEOUT_SECS").as_deref(),
                DEFAULT_AUTH_REQUEST_TIMEOUT_SECS,
            )),
            connect: Duration::from_secs(parse_u64(
                lookup("AUTH_CONNECT_TIMEOUT_SECS").as_deref(),
                DEFAULT_AUTH_CONNECT_TIMEOUT_SECS,
            )),
        };
        let store_path = lookup("SESSION_STORE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_SESSION_STORE_PATH), PathBuf::from);
        let restore_policy = parse_restore_policy(lookup("SESSION_RESTORE_POLICY").as_deref())?;

        Ok(Self { api_base_url, timeouts, store_path, restore_policy })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_AUTH_API_BASE_URL.to_owned(),
            timeouts: AuthTimeouts::default(),
            store_path: PathBuf::from(DEFAULT_SESSION_STORE_PATH),
            restore_policy: RestorePolicy::default(),
        }
    }
}

fn parse_base_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let url = raw.unwrap_or(DEFAULT_AUTH_API_BASE_URL).trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(url.to_owned()));
    }
    Ok(url.to_owned())
}

fn parse_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}

fn parse_restore_policy(raw: Option<&str>) -> Result<RestorePolicy, ConfigError> {
    match raw.map_or("trust", str::trim) {
        "trust" => Ok(RestorePolicy::Trust),
        "reject_expired" => Ok(RestorePolicy::RejectExpired),
        other => Err(ConfigError::UnknownRestorePolicy(other.to_owned())),
    }
}
