//! Configuration loading from TOML files
//!
//! Config file is selected via the --config command line argument. A
//! missing or malformed file falls back to compiled-in defaults, which
//! mirror the canonical two-lot deployment.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct LotSection {
    #[serde(default = "default_lot_name")]
    pub name: String,
    #[serde(default = "default_lot_port")]
    pub port: u16,
}

impl Default for LotSection {
    fn default() -> Self {
        Self { name: default_lot_name(), port: default_lot_port() }
    }
}

fn default_lot_name() -> String {
    "parqueadero1".to_string()
}

fn default_lot_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorSection {
    #[serde(default = "default_coordinator_port")]
    pub port: u16,
    /// Static base URLs of the lots to aggregate, in summary order.
    #[serde(default = "default_lot_endpoints")]
    pub lot_endpoints: Vec<String>,
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl Default for CoordinatorSection {
    fn default() -> Self {
        Self {
            port: default_coordinator_port(),
            lot_endpoints: default_lot_endpoints(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

fn default_coordinator_port() -> u16 {
    8083
}

fn default_lot_endpoints() -> Vec<String> {
    vec![
        "http://parqueadero1:8080".to_string(),
        "http://parqueadero2:8080".to_string(),
    ]
}

fn default_query_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub lot: LotSection,
    #[serde(default)]
    pub coordinator: CoordinatorSection,
}

/// Main configuration struct shared by both node binaries
#[derive(Debug, Clone)]
pub struct Config {
    lot_name: String,
    lot_port: u16,
    coordinator_port: u16,
    lot_endpoints: Vec<String>,
    query_timeout_ms: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lot_name: default_lot_name(),
            lot_port: default_lot_port(),
            coordinator_port: default_coordinator_port(),
            lot_endpoints: default_lot_endpoints(),
            query_timeout_ms: default_query_timeout_ms(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            lot_name: toml_config.lot.name,
            lot_port: toml_config.lot.port,
            coordinator_port: toml_config.coordinator.port,
            lot_endpoints: toml_config.coordinator.lot_endpoints,
            query_timeout_ms: toml_config.coordinator.query_timeout_ms,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn lot_name(&self) -> &str {
        &self.lot_name
    }

    pub fn lot_port(&self) -> u16 {
        self.lot_port
    }

    pub fn coordinator_port(&self) -> u16 {
        self.coordinator_port
    }

    pub fn lot_endpoints(&self) -> &[String] {
        &self.lot_endpoints
    }

    pub fn query_timeout_ms(&self) -> u64 {
        self.query_timeout_ms
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set the endpoint list
    #[cfg(test)]
    pub fn with_lot_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.lot_endpoints = endpoints;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.lot_name(), "parqueadero1");
        assert_eq!(config.lot_port(), 8080);
        assert_eq!(config.coordinator_port(), 8083);
        assert_eq!(config.query_timeout_ms(), 2000);
        assert_eq!(
            config.lot_endpoints(),
            &["http://parqueadero1:8080".to_string(), "http://parqueadero2:8080".to_string()]
        );
    }

    #[test]
    fn test_with_lot_endpoints() {
        let config = Config::default()
            .with_lot_endpoints(vec!["http://localhost:9000".to_string()]);
        assert_eq!(config.lot_endpoints(), &["http://localhost:9000".to_string()]);
    }
}
