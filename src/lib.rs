//! # Precatório Acquisition & Search Service
//!
//! ## Overview
//! This library implements a back-office search service for Brazilian
//! court-ordered payment obligations ("precatórios"). It queries the public
//! CNJ DataJud API, falls back to scraping the São Paulo DEPRE portal, and
//! normalizes the heterogeneous source shapes into one canonical case record
//! that is classified, filtered, persisted and served over HTTP.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `acquisition`: source strategies (DataJud API, DEPRE scrape, synthetic)
//! - `pipeline`: normalization, validation, classification, filtering and the
//!   orchestrator that composes the stages with per-stage statistics
//! - `analytics`: aggregate statistics over a record set
//! - `storage`: persistent storage of canonical case records
//! - `api`: REST API endpoints
//! - `config`: configuration management and settings
//! - `errors`: centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: search filters (value range, nature, budget year, status)
//! - **Output**: canonical case records plus pipeline stage statistics
//! - **Sources**: CNJ DataJud (official), DEPRE/ESAJ portals (scraped)
//!
//! ## Usage
//! ```rust,no_run
//! use precatorio_search::{Config, SearchParams};
//! use precatorio_search::pipeline::SearchPipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let pipeline = SearchPipeline::from_config(&config)?;
//!     let outcome = pipeline.search(&SearchParams::default()).await;
//!     println!("{} records", outcome.records.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod acquisition;
pub mod analytics;
pub mod api;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod storage;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use errors::{PrecatorioError, Result};
pub use pipeline::{FilterSpec, PipelineStats, SearchOutcome, SearchPipeline};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Coarse legal-category tag of a precatório; affects payment priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nature {
    Alimentar,
    #[serde(rename = "Tributária")]
    Tributaria,
    #[serde(rename = "Previdenciária")]
    Previdenciaria,
    Comum,
}

impl Nature {
    /// Parse a user-supplied nature filter. The sentinels "Todas"/"Todos",
    /// the empty string and unrecognized values all mean "no constraint".
    pub fn parse_filter(value: &str) -> Option<Self> {
        match value.trim() {
            "Alimentar" => Some(Nature::Alimentar),
            "Tributária" | "Tributaria" => Some(Nature::Tributaria),
            "Previdenciária" | "Previdenciaria" => Some(Nature::Previdenciaria),
            "Comum" => Some(Nature::Comum),
            _ => None,
        }
    }
}

impl fmt::Display for Nature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Nature::Alimentar => "Alimentar",
            Nature::Tributaria => "Tributária",
            Nature::Previdenciaria => "Previdenciária",
            Nature::Comum => "Comum",
        };
        f.write_str(name)
    }
}

/// Processing status of a precatório within the payment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    Pendente,
    #[serde(rename = "Em Análise")]
    EmAnalise,
    Aprovado,
    Rejeitado,
    Finalizado,
}

impl CaseStatus {
    /// Parse a user-supplied status filter; "Todos" and empty mean no
    /// constraint, unrecognized values are rejected.
    pub fn parse_filter(value: &str) -> Option<Self> {
        match value.trim() {
            "Pendente" => Some(CaseStatus::Pendente),
            "Em Análise" | "Em Analise" => Some(CaseStatus::EmAnalise),
            "Aprovado" => Some(CaseStatus::Aprovado),
            "Rejeitado" => Some(CaseStatus::Rejeitado),
            "Finalizado" => Some(CaseStatus::Finalizado),
            _ => None,
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaseStatus::Pendente => "Pendente",
            CaseStatus::EmAnalise => "Em Análise",
            CaseStatus::Aprovado => "Aprovado",
            CaseStatus::Rejeitado => "Rejeitado",
            CaseStatus::Finalizado => "Finalizado",
        };
        f.write_str(name)
    }
}

/// Canonical case record, the unit the rest of the system operates on.
///
/// Every field has a defined default so the normalizer is total; a record only
/// flows downstream once its case number passes validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    /// CNJ-formatted case number (NNNNNNN-DD.AAAA.J.TR.OOOO or raw digits)
    pub case_number: String,
    /// Court code, e.g. "TJ-SP"
    pub court: String,
    /// Name of the active/claimant party
    pub creditor: String,
    /// Monetary claim amount; 0 means "unknown" and bypasses range filters
    pub claim_value: f64,
    /// Procedural class, free text
    pub case_class: String,
    /// Comma-joined subject names
    pub subject: String,
    /// Filing date, normalized from the source's date encoding
    pub filing_date: NaiveDate,
    /// Judicial district (comarca)
    pub district: String,
    /// Court division (vara)
    pub court_division: String,
    /// Derived legal-category tag
    pub nature: Nature,
    /// Budget law (LOA) year the payment is scheduled in
    pub budget_year: i32,
    /// Payment workflow status
    pub status: CaseStatus,
    /// Provenance marker, e.g. "datajud-api" or "depre-scrape"
    pub source_tag: String,
}

/// Parameters of one search invocation, as accepted by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Court to query, e.g. "TJ-SP"
    pub court: String,
    /// Number of records to return (1..=100)
    pub quantity: usize,
    /// Optional record-level constraints
    pub filter: FilterSpec,
}

impl SearchParams {
    pub const DEFAULT_QUANTITY: usize = 30;
    pub const MAX_QUANTITY: usize = 100;

    /// Clamp the requested quantity into the supported 1..=100 range.
    pub fn clamped_quantity(&self) -> usize {
        self.quantity.clamp(1, Self::MAX_QUANTITY)
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            court: "TJ-SP".to_string(),
            quantity: Self::DEFAULT_QUANTITY,
            filter: FilterSpec::default(),
        }
    }
}

/// Application state shared across components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub pipeline: Arc<pipeline::SearchPipeline>,
    pub storage: Arc<storage::Storage>,
    pub history: Arc<api::SearchHistory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nature_filter_parses_known_values() {
        assert_eq!(Nature::parse_filter("Alimentar"), Some(Nature::Alimentar));
        assert_eq!(Nature::parse_filter("Tributaria"), Some(Nature::Tributaria));
        assert_eq!(Nature::parse_filter("Comum"), Some(Nature::Comum));
    }

    #[test]
    fn nature_filter_treats_sentinels_and_unknowns_as_no_constraint() {
        assert_eq!(Nature::parse_filter(""), None);
        assert_eq!(Nature::parse_filter("Todas"), None);
        assert_eq!(Nature::parse_filter("Todos"), None);
        assert_eq!(Nature::parse_filter("Alimenttar"), None);
    }

    #[test]
    fn status_filter_rejects_unknown_values() {
        assert_eq!(CaseStatus::parse_filter("Pendente"), Some(CaseStatus::Pendente));
        assert_eq!(CaseStatus::parse_filter("Todos"), None);
        assert_eq!(CaseStatus::parse_filter("garbage"), None);
    }

    #[test]
    fn quantity_clamps_into_the_supported_range() {
        let mut params = SearchParams::default();
        assert_eq!(params.clamped_quantity(), 30);
        params.quantity = 0;
        assert_eq!(params.clamped_quantity(), 1);
        params.quantity = 500;
        assert_eq!(params.clamped_quantity(), 100);
    }
}
