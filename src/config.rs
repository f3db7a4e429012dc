//! Configuration loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server identity and listen address.
    #[serde(default)]
    pub server: ServerConfig,
    /// Authentication handshake configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, used in log output.
    #[serde(default = "default_name")]
    pub name: String,
    /// Address the server listens on.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            listen: default_listen(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Path to the credentials file (a `[users]` table of name -> secret).
    #[serde(default = "default_passwd_path")]
    pub passwd_path: String,
    /// Seconds a client gets to complete the whole handshake (default: 2).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            passwd_path: default_passwd_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_name() -> String {
    "chatterd".to_string()
}

fn default_listen() -> SocketAddr {
    "127.0.0.1:36963".parse().expect("valid default address")
}

fn default_passwd_path() -> String {
    "passwd.toml".to_string()
}

fn default_timeout_secs() -> u64 {
    2
}
