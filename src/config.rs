// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Daemon configuration
//!
//! Configuration is read from a TOML file and then adjusted from the
//! environment. Every key has a default, so an empty file (or no file at all)
//! yields a working configuration.
//!
//! # Search Order
//!
//! 1. `$DYNDNSD_CONFIG` (an explicit path; it must exist)
//! 2. `~/.config/dyndnsd/config.toml`
//! 3. `/etc/dyndnsd/config.toml`
//!
//! # Environment Overrides
//!
//! - `DYNDNSD_HOST`: listen host
//! - `DYNDNSD_PORT`: listen port
//!
//! # Example
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 8245
//! domain = "dyn.example.com"
//!
//! [updater]
//! name = "zonefile"
//!
//! [updater.params]
//! zone_file = "/var/cache/bind/dyn.example.com.zone"
//! dns = "ns1.example.com."
//! email_addr = "hostmaster.example.com."
//! serial_incrementer = "iso8601"
//! command = "rndc reload dyn.example.com"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::serial::SerialPolicy;

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "DYNDNSD_CONFIG";
/// Environment variable overriding the listen host
pub const HOST_ENV: &str = "DYNDNSD_HOST";
/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "DYNDNSD_PORT";

const SYSTEM_CONFIG_PATH: &str = "/etc/dyndnsd/config.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Listen host (default: 127.0.0.1)
    pub host: String,

    /// Listen port (default: 8245)
    pub port: u16,

    /// Domain whose zone is maintained; hostnames must fall under it
    pub domain: String,

    pub updater: UpdaterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8245,
            domain: "zyx.zig.zag".to_string(),
            updater: UpdaterConfig::default(),
        }
    }
}

/// Updater backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdaterKind {
    /// Rewrite a master zone file on disk
    #[default]
    Zonefile,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UpdaterConfig {
    pub name: UpdaterKind,
    pub params: ZoneFileParams,
}

/// Parameters of the zone file updater
///
/// # Default Values
///
/// - `ttl`: 300 seconds (A/AAAA records)
/// - `soattl` / `nsttl`: 1800 seconds
/// - `refresh`: 900, `retry`: 300, `expire`: 86400, `negttl`: 900
/// - `serial_incrementer`: `epoch_s`
/// - `command_timeout_secs`: 30
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZoneFileParams {
    /// Zone file path
    pub zone_file: PathBuf,

    /// Primary nameserver, used for the SOA MNAME and the apex NS record
    pub dns: String,

    /// Admin mailbox in domain-name form, used for the SOA RNAME
    pub email_addr: String,

    pub serial_incrementer: SerialPolicy,

    /// TTL of A/AAAA records added by the updater
    pub ttl: u32,

    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,

    /// SOA minimum (negative caching TTL)
    pub negttl: u32,

    pub soattl: u32,
    pub nsttl: u32,

    /// Command run after every successful zone write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Upper bound on the post-update command's run time
    pub command_timeout_secs: u64,
}

impl Default for ZoneFileParams {
    fn default() -> Self {
        Self {
            zone_file: PathBuf::from("zyx.zig.zag.zone"),
            dns: "ns.zig.zag.".to_string(),
            email_addr: "hostmaster.zig.zag.".to_string(),
            serial_incrementer: SerialPolicy::Epoch,
            ttl: 300,
            refresh: 900,
            retry: 300,
            expire: 86400,
            negttl: 900,
            soattl: 1800,
            nsttl: 1800,
            command: None,
            command_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Locate, load, override from the environment and validate the configuration
    ///
    /// Returns the configuration and the file it came from, if any.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let path = find_config_file(explicit)?;

        let mut config = match &path {
            Some(path) => {
                info!("loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                warn!("no configuration file found, using built-in defaults");
                Self::default()
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok((config, path))
    }

    /// Apply `DYNDNSD_HOST` / `DYNDNSD_PORT`
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var(HOST_ENV) {
            debug!("listen host overridden from environment: {}", host);
            self.host = host;
        }

        if let Ok(port) = std::env::var(PORT_ENV) {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{} is not a port: {}", PORT_ENV, port)))?;
            debug!("listen port overridden from environment: {}", self.port);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let params = &self.updater.params;

        if self.zone_name().is_empty() {
            return Err(ConfigError::Invalid("domain must not be empty".to_string()));
        }

        if params.zone_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "updater.params.zone_file must not be empty".to_string(),
            ));
        }

        if params.dns.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "updater.params.dns must not be empty".to_string(),
            ));
        }

        if params.email_addr.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "updater.params.email_addr must not be empty".to_string(),
            ));
        }

        if params.command_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "updater.params.command_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Domain without a trailing dot
    pub fn zone_name(&self) -> &str {
        self.domain.trim().trim_end_matches('.')
    }

    /// Socket address string to bind
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Standard configuration file locations, most specific first
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config").join("dyndnsd").join("config.toml"));
    }
    paths.push(PathBuf::from(SYSTEM_CONFIG_PATH));
    paths
}

/// Find the configuration file
///
/// An explicit path must exist; otherwise the first existing standard
/// location wins, and `None` means no file was found.
pub fn find_config_file(explicit: Option<PathBuf>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        return Ok(Some(path));
    }

    Ok(config_search_paths().into_iter().find(|path| path.exists()))
}
