//! Configuration structures.

use config::ConfigError;
use quant_session::SessionLimits;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub session: SessionLimits,
    #[serde(default)]
    pub strategies: StrategySettings,
}

impl AppConfig {
    /// Check values that deserialize but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.validate().map_err(ConfigError::Message)?;
        self.server.socket_addr()?;
        Ok(())
    }
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "quant-runner".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Session protocol variant served to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Candle batches in, chunked signals and state out
    #[default]
    Batched,
    /// One candle in, one tick out
    Streaming,
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "batched" => Ok(Protocol::Batched),
            "streaming" => Ok(Protocol::Streaming),
            other => Err(format!("Unknown protocol: {other}")),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Batched => f.write_str("batched"),
            Protocol::Streaming => f.write_str("streaming"),
        }
    }
}

/// Session server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen_addr: String,
    pub protocol: Protocol,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:7000".to_string(),
            protocol: Protocol::Batched,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .parse()
            .map_err(|e| ConfigError::Message(format!("Invalid listen address {}: {e}", self.listen_addr)))
    }
}

/// Which registered strategies sessions may create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StrategySettings {
    /// Strategy names; empty enables every registered strategy
    pub enabled: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.protocol, Protocol::Batched);
        assert_eq!(config.session.signal_chunk_size, 200);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_protocol_from_str() {
        assert_eq!("Streaming".parse::<Protocol>(), Ok(Protocol::Streaming));
        assert!("grpc".parse::<Protocol>().is_err());
        assert_eq!(Protocol::Batched.to_string(), "batched");
    }
}
