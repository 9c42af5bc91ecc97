//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the precatório search service, providing
//! typed errors for the acquisition, pipeline, storage and API layers.
//!
//! ## Input/Output Specification
//! - **Input**: error conditions from various system components
//! - **Output**: structured error types with context and error chains
//! - **Error Categories**: acquisition, configuration, storage, api, generic
//!
//! ## Key Features
//! - Hierarchical error types with detailed context
//! - Automatic error conversion and chaining
//! - Recoverability classification for the orchestrator's fallback logic
//!
//! ## Usage
//! ```rust
//! use precatorio_search::errors::{Result, PrecatorioError};
//!
//! fn acquisition_step() -> Result<Vec<String>> {
//!     Err(PrecatorioError::AcquisitionTimeout {
//!         source_name: "DataJud CNJ".to_string(),
//!         timeout_ms: 30_000,
//!     })
//! }
//! ```

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, PrecatorioError>;

/// Comprehensive error types for the precatório search service
#[derive(Debug, Error)]
pub enum PrecatorioError {
    // Acquisition errors
    /// Network failure reaching an external source
    #[error("Network error contacting {source_name}: {details}")]
    AcquisitionNetwork { source_name: String, details: String },

    /// Bounded request timeout elapsed
    #[error("Request to {source_name} timed out after {timeout_ms}ms")]
    AcquisitionTimeout { source_name: String, timeout_ms: u64 },

    /// Non-2xx HTTP status from the external source
    #[error("{source_name} returned HTTP {status}: {body}")]
    AcquisitionStatus {
        source_name: String,
        status: u16,
        body: String,
    },

    /// 401 from the structured API; credentials missing or expired
    #[error("Authentication with {source_name} failed: {details}")]
    AuthenticationFailed { source_name: String, details: String },

    /// Response body could not be parsed into the expected shape
    #[error("Failed to parse data from {source_name}: {details}")]
    DataParsing { source_name: String, details: String },

    /// Source is disabled or unusable with the current configuration
    #[error("Data source '{source_name}' is unavailable: {details}")]
    SourceUnavailable { source_name: String, details: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    // Storage errors
    #[error("Database connection failed: {db_path} - {reason}")]
    DatabaseConnectionFailed { db_path: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization failed: {message}")]
    SerializationFailed { message: String },

    // API errors
    #[error("Invalid API request: {details}")]
    InvalidApiRequest { details: String },

    // System errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PrecatorioError {
    /// Check if the error is recoverable by trying a fallback source
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PrecatorioError::AcquisitionNetwork { .. }
                | PrecatorioError::AcquisitionTimeout { .. }
                | PrecatorioError::AcquisitionStatus { .. }
                | PrecatorioError::AuthenticationFailed { .. }
                | PrecatorioError::DataParsing { .. }
                | PrecatorioError::SourceUnavailable { .. }
        )
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            PrecatorioError::AcquisitionNetwork { .. }
            | PrecatorioError::AcquisitionTimeout { .. }
            | PrecatorioError::AcquisitionStatus { .. }
            | PrecatorioError::AuthenticationFailed { .. }
            | PrecatorioError::DataParsing { .. }
            | PrecatorioError::SourceUnavailable { .. } => "acquisition",
            PrecatorioError::Config { .. } | PrecatorioError::ValidationFailed { .. } => {
                "configuration"
            }
            PrecatorioError::DatabaseConnectionFailed { .. }
            | PrecatorioError::Database(_)
            | PrecatorioError::SerializationFailed { .. } => "storage",
            PrecatorioError::InvalidApiRequest { .. } => "api",
            PrecatorioError::Internal { .. } => "generic",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for PrecatorioError {
    fn from(err: std::io::Error) -> Self {
        PrecatorioError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for PrecatorioError {
    fn from(err: serde_json::Error) -> Self {
        PrecatorioError::SerializationFailed {
            message: format!("JSON serialization error: {}", err),
        }
    }
}

impl From<bincode::Error> for PrecatorioError {
    fn from(err: bincode::Error) -> Self {
        PrecatorioError::SerializationFailed {
            message: format!("Binary serialization error: {}", err),
        }
    }
}

impl From<toml::de::Error> for PrecatorioError {
    fn from(err: toml::de::Error) -> Self {
        PrecatorioError::Config {
            message: format!("TOML parse error: {}", err),
        }
    }
}

/// Map a reqwest failure against a named source into the acquisition taxonomy.
pub fn acquisition_error(source_name: &str, timeout_ms: u64, err: reqwest::Error) -> PrecatorioError {
    if err.is_timeout() {
        PrecatorioError::AcquisitionTimeout {
            source_name: source_name.to_string(),
            timeout_ms,
        }
    } else {
        PrecatorioError::AcquisitionNetwork {
            source_name: source_name.to_string(),
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquisition_errors_are_recoverable() {
        let err = PrecatorioError::AcquisitionTimeout {
            source_name: "DataJud CNJ".to_string(),
            timeout_ms: 30_000,
        };
        assert!(err.is_recoverable());
        assert_eq!(err.category(), "acquisition");
    }

    #[test]
    fn storage_errors_are_not_recoverable() {
        let err = PrecatorioError::DatabaseConnectionFailed {
            db_path: "./data/db".to_string(),
            reason: "locked".to_string(),
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.category(), "storage");
    }
}
