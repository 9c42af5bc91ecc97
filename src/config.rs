//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the precatório search service,
//! supporting TOML files and environment-variable overrides with validation
//! and type-safe access to all system settings.
//!
//! ## Input/Output Specification
//! - **Input**: configuration files (TOML), environment variables
//! - **Output**: validated configuration structs with defaults and overrides
//! - **Validation**: type checking, range validation, credential presence
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Command line arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration files
//! 4. Default values (lowest priority)
//!
//! ## Usage
//! ```rust
//! use precatorio_search::config::Config;
//!
//! let config = Config::from_file("config.toml").unwrap();
//! println!("Server port: {}", config.server.port);
//! ```

use crate::errors::{PrecatorioError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// Data acquisition settings
    pub acquisition: AcquisitionConfig,
    /// Storage and database settings
    pub storage: StorageConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Number of search-history entries kept in memory
    pub history_size: usize,
}

/// Data acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// CNJ DataJud settings
    pub datajud: DatajudConfig,
    /// DEPRE/ESAJ portal settings
    pub portal: PortalConfig,
    /// Allow the synthetic generator as last-resort fallback
    pub enable_synthetic_fallback: bool,
    /// Query cache TTL in seconds (0 disables caching)
    pub cache_ttl_seconds: u64,
    /// Enrichment configuration
    pub enrichment: EnrichmentConfig,
}

/// CNJ DataJud API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatajudConfig {
    /// API base URL
    pub base_url: String,
    /// API key; sent as `Authorization: APIKey <key>`
    pub api_key: String,
    /// Per-tribunal search endpoint paths
    pub endpoints: HashMap<String, String>,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

/// DEPRE/ESAJ portal scraping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// DEPRE portal base URL
    pub depre_base_url: String,
    /// ESAJ base URL (per-case detail pages)
    pub esaj_base_url: String,
    /// User-Agent strings rotated per request
    pub user_agents: Vec<String>,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

/// Late-enrichment (ESAJ detail lookup) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Enable the per-case ESAJ detail lookup
    pub enabled: bool,
    /// Maximum records enriched per search
    pub max_records: usize,
    /// Delay between detail requests in milliseconds
    pub delay_ms: u64,
}

/// Storage and database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path
    pub db_path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
            history_size: 100,
        }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            datajud: DatajudConfig::default(),
            portal: PortalConfig::default(),
            enable_synthetic_fallback: false,
            cache_ttl_seconds: 1800,
            enrichment: EnrichmentConfig::default(),
        }
    }
}

impl Default for DatajudConfig {
    fn default() -> Self {
        let mut endpoints = HashMap::new();
        for (court, path) in [
            ("TJ-SP", "/api_publica_tjsp/_search"),
            ("TJ-RJ", "/api_publica_tjrj/_search"),
            ("TJ-MG", "/api_publica_tjmg/_search"),
            ("TJ-RS", "/api_publica_tjrs/_search"),
            ("TJ-PR", "/api_publica_tjpr/_search"),
            ("TJ-BA", "/api_publica_tjba/_search"),
            ("TJ-SC", "/api_publica_tjsc/_search"),
            ("TJ-PE", "/api_publica_tjpe/_search"),
        ] {
            endpoints.insert(court.to_string(), path.to_string());
        }

        Self {
            base_url: "https://api-publica.datajud.cnj.jus.br".to_string(),
            api_key: String::new(),
            endpoints,
            timeout_ms: 30_000,
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            depre_base_url: "https://www.tjsp.jus.br/Depre".to_string(),
            esaj_base_url: "https://esaj.tjsp.jus.br".to_string(),
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36".to_string(),
            ],
            timeout_ms: 30_000,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_records: 5,
            delay_ms: 2000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/precatorio_search.db"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| PrecatorioError::Config {
                message: format!("Failed to read config file {:?}: {}", path, e),
            })?;
            toml::from_str(&content)?
        } else {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("PRECATORIO_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PRECATORIO_PORT") {
            self.server.port = port.parse().map_err(|_| PrecatorioError::Config {
                message: "Invalid port number in PRECATORIO_PORT".to_string(),
            })?;
        }
        if let Ok(api_key) = std::env::var("DATAJUD_API_KEY") {
            self.acquisition.datajud.api_key = api_key;
        }
        if let Ok(base_url) = std::env::var("DATAJUD_BASE_URL") {
            self.acquisition.datajud.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("DATAJUD_TIMEOUT_MS") {
            self.acquisition.datajud.timeout_ms =
                timeout.parse().map_err(|_| PrecatorioError::Config {
                    message: "Invalid value in DATAJUD_TIMEOUT_MS".to_string(),
                })?;
        }
        if let Ok(db_path) = std::env::var("PRECATORIO_DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(PrecatorioError::ValidationFailed {
                field: "server.port".to_string(),
                reason: "Port cannot be zero".to_string(),
            });
        }

        if self.acquisition.datajud.timeout_ms == 0 {
            return Err(PrecatorioError::ValidationFailed {
                field: "acquisition.datajud.timeout_ms".to_string(),
                reason: "Timeout must be greater than zero".to_string(),
            });
        }

        if self.acquisition.datajud.endpoints.is_empty() {
            return Err(PrecatorioError::ValidationFailed {
                field: "acquisition.datajud.endpoints".to_string(),
                reason: "At least one tribunal endpoint must be configured".to_string(),
            });
        }

        if self.acquisition.portal.user_agents.is_empty() {
            return Err(PrecatorioError::ValidationFailed {
                field: "acquisition.portal.user_agents".to_string(),
                reason: "At least one User-Agent string is required".to_string(),
            });
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PrecatorioError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.acquisition.datajud.timeout_ms, 30_000);
        assert_eq!(config.acquisition.cache_ttl_seconds, 1800);
    }

    #[test]
    fn default_endpoints_cover_tjsp() {
        let config = Config::default();
        assert_eq!(
            config.acquisition.datajud.endpoints.get("TJ-SP").map(String::as_str),
            Some("/api_publica_tjsp/_search")
        );
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.acquisition.datajud.base_url, config.acquisition.datajud.base_url);
    }
}
