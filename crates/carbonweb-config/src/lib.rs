//! Configuration management for carbonweb
//!
//! This module handles loading, validation, and management of
//! carbonweb configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the data directory
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// Registry snapshot file name
    #[serde(default = "default_data_file")]
    pub data_file: String,
    /// Persist the registry after every mutating operation
    #[serde(default = "default_true")]
    pub autosave: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            data_file: default_data_file(),
            autosave: default_true(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_data_file() -> String {
    "registry.json".to_string()
}

fn default_true() -> bool {
    true
}

/// Template code generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodesConfig {
    /// Fixed code prefix (e.g., "CS" for carbon survey)
    #[serde(default = "default_code_prefix")]
    pub prefix: String,
    /// Number of random characters in the code suffix
    #[serde(default = "default_code_length")]
    pub random_length: usize,
    /// Maximum generate-and-insert attempts before giving up
    #[serde(default = "default_code_attempts")]
    pub max_attempts: usize,
}

impl Default for CodesConfig {
    fn default() -> Self {
        Self {
            prefix: default_code_prefix(),
            random_length: default_code_length(),
            max_attempts: default_code_attempts(),
        }
    }
}

fn default_code_prefix() -> String {
    "CS".to_string()
}

fn default_code_length() -> usize {
    6
}

fn default_code_attempts() -> usize {
    5
}

/// Display and number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Decimal places for carbon amounts in reports
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Unit label appended to formatted amounts
    #[serde(default = "default_unit_label")]
    pub unit_label: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            decimal_places: default_decimal_places(),
            unit_label: default_unit_label(),
        }
    }
}

fn default_decimal_places() -> u32 {
    2
}

fn default_unit_label() -> String {
    "kg CO2".to_string()
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Records per page for lists
    #[serde(default = "default_records_per_page")]
    pub records_per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            records_per_page: default_records_per_page(),
        }
    }
}

fn default_records_per_page() -> usize {
    50
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
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

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Data directory settings
    #[serde(default)]
    pub data: DataConfig,
    /// Template code generation settings
    #[serde(default)]
    pub codes: CodesConfig,
    /// Display settings
    #[serde(default)]
    pub display: DisplayConfig,
    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path)
            .map_err(|_| ConfigError::FileNotFound { path: path.to_string_lossy().to_string() })?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|_| ConfigError::InvalidYaml)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.codes.prefix.is_empty()
            || !self.codes.prefix.chars().all(|c| c.is_ascii_uppercase())
        {
            return Err(ConfigError::InvalidValue {
                field: "codes.prefix".to_string(),
                reason: "Prefix must be 1+ uppercase ASCII letters".to_string(),
            });
        }

        if self.codes.random_length == 0 || self.codes.random_length > 16 {
            return Err(ConfigError::InvalidValue {
                field: "codes.random_length".to_string(),
                reason: "Random length must be between 1 and 16".to_string(),
            });
        }

        if self.codes.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "codes.max_attempts".to_string(),
                reason: "At least one generation attempt is required".to_string(),
            });
        }

        if self.display.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "display.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Get the full path to the registry data file
    pub fn data_file_path(&self) -> PathBuf {
        self.data.path.join(&self.data.data_file)
    }
}

// ==================== Tests ====================
