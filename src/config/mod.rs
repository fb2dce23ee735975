//! Configuration module for the beta 1.8.1 server
//!
//! Loads server settings from a TOML file. Every key has a default, so an
//! empty file (or no file at all) yields a working configuration.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::*;
use crate::protocol::{PacketSchema, SchemaTable};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config value {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Complete server configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettingsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

// =============================================================================
// [server]
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettingsConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_motd")]
    pub motd: String,
    #[serde(default = "default_max_players")]
    pub max_players: u8,
    #[serde(default)]
    pub seed: i64,
}

impl Default for ServerSettingsConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            motd: default_motd(),
            max_players: default_max_players(),
            seed: 0,
        }
    }
}

// =============================================================================
// [logging]
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// =============================================================================
// [network]
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
    #[serde(default = "default_keep_alive_interval")]
    pub keep_alive_interval_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_max_connections_per_ip")]
    pub max_connections_per_ip: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_frame_size: default_max_frame_size(),
            connection_timeout_secs: default_connection_timeout(),
            keep_alive_interval_secs: default_keep_alive_interval(),
            max_connections: default_max_connections(),
            max_connections_per_ip: default_max_connections_per_ip(),
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { DEFAULT_PORT }
fn default_motd() -> String { "A Minecraft Server".to_string() }
fn default_max_players() -> u8 { DEFAULT_MAX_PLAYERS }
fn default_log_level() -> String { "info".to_string() }
fn default_max_frame_size() -> usize { DEFAULT_MAX_FRAME_SIZE }
fn default_connection_timeout() -> u64 { CONNECTION_TIMEOUT_SECS }
fn default_keep_alive_interval() -> u64 { KEEP_ALIVE_INTERVAL_SECS }
fn default_max_connections() -> usize { MAX_TOTAL_CONNECTIONS }
fn default_max_connections_per_ip() -> usize { MAX_CONNECTIONS_PER_IP }

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = load_toml::<Config>(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, using defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: "<inline>".to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Address the server listens on.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // The motd shares the ping reply with two numbers, split by the separator.
        if self.server.motd.contains(PING_SEPARATOR) {
            return Err(ConfigError::InvalidValue {
                key: "server.motd",
                reason: format!("must not contain '{}'", PING_SEPARATOR),
            });
        }
        let smallest_limit = largest_min_frame_len();
        if self.network.max_frame_size < smallest_limit {
            return Err(ConfigError::InvalidValue {
                key: "network.max_frame_size",
                reason: format!("must be at least {}", smallest_limit),
            });
        }
        if self.network.connection_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "network.connection_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.network.keep_alive_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "network.keep_alive_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Shortest frame limit that still admits every packet in the standard table.
fn largest_min_frame_len() -> usize {
    SchemaTable::standard()
        .ok()
        .and_then(|table| table.iter().map(PacketSchema::min_frame_len).max())
        .unwrap_or(OPCODE_LEN + STRING16_PREFIX_LEN)
}

fn load_toml<T>(path: &Path) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let path_str = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path_str.clone(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path_str,
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config() {
        let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/server.toml"));
        assert!(config.is_ok(), "Failed to load config: {:?}", config.err());

        let config = config.unwrap();
        assert_eq!(config.server.port, 25565);
        assert_eq!(config.network.max_frame_size, 8192);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.server.max_players, DEFAULT_MAX_PLAYERS);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.network.keep_alive_interval_secs, KEEP_ALIVE_INTERVAL_SECS);
        assert_eq!(config.bind_addr(), "0.0.0.0:25565");
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            r#"
            [server]
            port = 25566
            motd = "Beta world"

            [network]
            max_connections_per_ip = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 25566);
        assert_eq!(config.server.motd, "Beta world");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.network.max_connections_per_ip, 1);
        assert_eq!(config.network.max_connections, MAX_TOTAL_CONNECTIONS);
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_toml_str("[server]\nmotd = \"a\u{a7}b\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "server.motd", .. }));

        let err = Config::from_toml_str("[network]\nmax_frame_size = 1\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "network.max_frame_size",
                ..
            }
        ));

        let err = Config::from_toml_str("[network]\nconnection_timeout_secs = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "network.connection_timeout_secs",
                ..
            }
        ));

        let err = Config::from_toml_str("[server]\nport = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_frame_limit_fits_every_packet() {
        let largest = largest_min_frame_len();
        // player_pos_look_c2s: opcode, four doubles, two floats, a bool
        assert!(largest >= 42);

        let too_small = format!("[network]\nmax_frame_size = {}\n", largest - 1);
        assert!(matches!(
            Config::from_toml_str(&too_small),
            Err(ConfigError::InvalidValue {
                key: "network.max_frame_size",
                ..
            })
        ));

        let exact = format!("[network]\nmax_frame_size = {}\n", largest);
        assert_eq!(Config::from_toml_str(&exact).unwrap().network.max_frame_size, largest);
        assert!(Config::from_toml_str("[network]\nmax_frame_size = 16\n").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Config::load_or_default("does/not/exist.toml").unwrap();
        assert_eq!(config.server.port, DEFAULT_PORT);

        assert!(matches!(
            Config::load("does/not/exist.toml"),
            Err(ConfigError::IoError { .. })
        ));
    }
}
