//! Configuration management

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest port the command line accepts
pub const MAX_PORT: u32 = 65445;
/// Longest connection password in bytes
pub const MAX_PASSWORD_LENGTH: usize = 64;

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server information
    pub server: ServerConfig,
    /// Connection settings
    pub connection: ConnectionConfig,
    /// Module settings
    pub modules: ModuleConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server name, used as the prefix of every server reply
    pub name: String,
    /// Server version
    pub version: String,
    /// Server creation date
    pub created: String,
    /// Advertised host used in relay prefixes; discovered at startup when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Message of the day, one entry per line
    pub motd: Vec<String>,
    /// Maximum channel name length
    pub max_channel_name_length: usize,
    /// Maximum topic length
    pub max_topic_length: usize,
}

/// Connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Bind address
    pub bind_address: String,
    /// Bytes requested per read
    pub read_buffer_size: usize,
    /// Maximum unterminated input held per session
    pub max_recvq: usize,
    /// Idle seconds before a liveness probe is sent; unset disables the sweep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping_frequency: Option<u64>,
    /// Seconds an unanswered probe is tolerated
    pub ping_timeout: u64,
}

/// Module settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Names of optional modules to load
    pub enabled: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "relayircd".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            host: None,
            motd: vec!["Have a wonderful day!!".to_string()],
            max_channel_name_length: 50,
            max_topic_length: 390,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            read_buffer_size: 1024,
            max_recvq: 8192,
            ping_frequency: None,
            ping_timeout: 120,
        }
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            enabled: vec!["bot".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.name.is_empty() {
            return Err(Error::Config("Server name cannot be empty".to_string()));
        }

        if self.server.name.contains(' ') {
            return Err(Error::Config("Server name cannot contain spaces".to_string()));
        }

        if self.connection.read_buffer_size == 0 {
            return Err(Error::Config("Read buffer size must be greater than 0".to_string()));
        }

        if self.connection.max_recvq < self.connection.read_buffer_size {
            return Err(Error::Config(format!(
                "max_recvq ({}) must be at least the read buffer size ({})",
                self.connection.max_recvq, self.connection.read_buffer_size
            )));
        }

        if self.connection.ping_timeout == 0 {
            return Err(Error::Config("Ping timeout must be greater than 0".to_string()));
        }

        if self.connection.ping_frequency == Some(0) {
            return Err(Error::Config("Ping frequency must be greater than 0".to_string()));
        }

        if self.server.max_channel_name_length < 2 {
            return Err(Error::Config("Channel names must allow at least 2 characters".to_string()));
        }

        Ok(())
    }
}

/// Parse the listening port given on the command line.
///
/// Accepts one to five decimal digits whose value lies in `0..=65445`.
pub fn parse_port(raw: &str) -> Result<u16> {
    if raw.is_empty() || raw.len() > 5 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Config(format!("Invalid port '{}'", raw)));
    }

    let value: u32 = raw
        .parse()
        .map_err(|_| Error::Config(format!("Invalid port '{}'", raw)))?;

    if value > MAX_PORT {
        return Err(Error::Config(format!(
            "Port {} is out of range (0-{})",
            value, MAX_PORT
        )));
    }

    Ok(value as u16)
}

/// Validate the connection password given on the command line
pub fn parse_password(raw: &str) -> Result<String> {
    if raw.is_empty() {
        return Err(Error::Config("Password cannot be empty".to_string()));
    }
    if raw.len() > MAX_PASSWORD_LENGTH {
        return Err(Error::Config(format!(
            "Password cannot exceed {} bytes",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(raw.to_string())
}
