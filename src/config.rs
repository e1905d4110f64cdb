//! Server configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! `from_env` is a thin shell over `from_lookup`, which takes any key lookup.
//! Tests drive `from_lookup` with a map so they never touch the process env.

use std::net::{IpAddr, SocketAddr};
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_ASSET_DIR: &str = "dist";
pub const DEFAULT_ENTRY_DOCUMENT: &str = "index.html";

/// Errors produced while reading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT: {0}")]
    InvalidPort(String),

    #[error("invalid BIND_ADDR: {0}")]
    InvalidBindAddr(String),

    #[error("invalid ENTRY_DOCUMENT '{0}': must be a relative path inside the asset root")]
    InvalidEntryDocument(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub asset_dir: PathBuf,
    pub entry_document: PathBuf,
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `BIND_ADDR`: default `0.0.0.0`
    /// - `ASSET_DIR`: default `dist`
    /// - `ENTRY_DOCUMENT`: default `index.html`, relative to `ASSET_DIR`
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` or `BIND_ADDR` cannot be parsed, or if
    /// `ENTRY_DOCUMENT` would point outside the asset root.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = bind_raw
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw.clone()))?;

        let asset_dir = lookup("ASSET_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_ASSET_DIR), PathBuf::from);

        let entry_raw = lookup("ENTRY_DOCUMENT").unwrap_or_else(|| DEFAULT_ENTRY_DOCUMENT.to_owned());
        let entry_document = parse_entry_document(&entry_raw)?;

        Ok(Self { port, bind_addr, asset_dir, entry_document })
    }

    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_entry_document(raw: &str) -> Result<PathBuf, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidEntryDocument(raw.to_owned()));
    }
    let path = Path::new(trimmed);
    let contained = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !contained {
        return Err(ConfigError::InvalidEntryDocument(raw.to_owned()));
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
