//! Configuration loading and validation

use anyhow::{Context, Result};
use rovio_client::{ClientConfig, ConnectionSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Label used in log output
    #[serde(default = "default_name")]
    pub name: String,
    /// Host, port and credentials
    #[serde(flatten)]
    pub connection: ConnectionSettings,
    /// Speed for movement commands given without one (1-10)
    #[serde(default = "default_speed")]
    pub default_speed: u8,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            connection: ConnectionSettings::new(default_host()),
            default_speed: default_speed(),
            timeout_secs: default_timeout(),
        }
    }
}

impl DeviceConfig {
    /// Client configuration for this device
    pub fn client_config(&self) -> Result<ClientConfig> {
        let config = ClientConfig::new(self.connection.clone())?
            .with_default_speed(self.default_speed)?
            .with_timeout(Duration::from_secs(self.timeout_secs));
        Ok(config)
    }
}

fn default_name() -> String {
    "rovio".to_string()
}

fn default_host() -> String {
    "192.168.10.18".to_string() // Factory address in ad-hoc mode
}

fn default_speed() -> u8 {
    1
}

fn default_timeout() -> u64 {
    10
}

/// Load configuration from file, falling back to defaults when it is missing
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("rovio.toml")).unwrap();

        assert_eq!(config.device.name, "rovio");
        assert_eq!(config.device.connection.host, "192.168.10.18");
        assert_eq!(config.device.connection.port, 80);
        assert_eq!(config.device.default_speed, 1);
        assert_eq!(config.device.timeout_secs, 10);
    }

    #[test]
    fn test_load_device_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[device]
name = "living-room"
host = "10.0.0.42"
port = 8080
username = "admin"
password = "secret"
default_speed = 5
timeout_secs = 3
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        let device = &config.device;
        assert_eq!(device.name, "living-room");
        assert_eq!(device.connection.host, "10.0.0.42");
        assert_eq!(device.connection.port, 8080);
        assert_eq!(device.connection.username.as_deref(), Some("admin"));

        let client = device.client_config().unwrap();
        assert_eq!(client.default_speed(), 5);
        assert_eq!(client.timeout(), Duration::from_secs(3));
        assert_eq!(client.base_url().as_str(), "http://10.0.0.42:8080/");
        assert!(client.authorization().is_some());
    }

    #[test]
    fn test_invalid_speed_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[device]\nhost = \"rovio\"\ndefault_speed = 12").unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(config.device.client_config().is_err());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[device\nhost = ").unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
