//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, LogFormat, LoggingConfig, Protocol, ServerSettings, StrategySettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Load configuration from file and environment.
///
/// Environment variables override the file, e.g.
/// `QUANT__SERVER__LISTEN_ADDR=0.0.0.0:9000` or
/// `QUANT__STRATEGIES__ENABLED=Turtle,Aldo`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("QUANT")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("strategies.enabled")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = config.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from TOML text without environment overrides.
pub fn parse_config(text: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig =
        toml::from_str(text).map_err(|e| ConfigError::Message(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("quant-config-{}-{name}.toml", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_config_file() {
        let path = write_temp(
            "file",
            r#"
[server]
listen_addr = "127.0.0.1:7100"
protocol = "streaming"

[session]
signal_chunk_size = 50
"#,
        );
        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.listen_addr, "127.0.0.1:7100");
        assert_eq!(config.server.protocol, Protocol::Streaming);
        assert_eq!(config.session.signal_chunk_size, 50);
        assert_eq!(config.session.debug_chunk_size, 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_fails() {
        let path = std::env::temp_dir().join("quant-config-does-not-exist.toml");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = write_temp("env", "[app]\nenvironment = \"development\"\n");
        std::env::set_var("QUANT__APP__ENVIRONMENT", "production");
        let config = load_config(&path);
        std::env::remove_var("QUANT__APP__ENVIRONMENT");
        std::fs::remove_file(&path).ok();

        assert_eq!(config.unwrap().app.environment, "production");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(parse_config("[session]\ndebug_chunk_size = 0\n").is_err());
        assert!(parse_config("[server]\nlisten_addr = \"nowhere\"\n").is_err());
        assert!(parse_config("[server]\nprotocol = \"carrier-pigeon\"\n").is_err());
    }

    #[test]
    fn test_shipped_default_config() {
        let text = include_str!("../../../config/default.toml");
        let config = parse_config(text).unwrap();
        assert_eq!(config.server.protocol, Protocol::Batched);
        assert!(config.strategies.enabled.is_empty());
    }
}
