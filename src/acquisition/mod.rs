//! # Data Acquisition Module
//!
//! ## Purpose
//! Pluggable acquisition strategies for precatório case data: the official
//! CNJ DataJud API, the São Paulo DEPRE portal scraper, an ESAJ detail
//! enricher, and a deterministic synthetic generator used as last-resort
//! fallback in development environments.
//!
//! ## Strategy Order
//! The orchestrator tries strategies in a fixed order and stops at the first
//! one that yields candidates. A strategy failure is recoverable; only the
//! exhaustion of every strategy surfaces to the caller.

pub mod datajud;
pub mod depre;
pub mod esaj;
pub mod synthetic;

pub use datajud::{DatajudProcess, DatajudSource};
pub use depre::{DepreSource, PortalRow};
pub use esaj::{EsajDetail, EsajEnricher};
pub use synthetic::{SyntheticCase, SyntheticSource};

use crate::errors::Result;
use crate::FilterSpec;
use async_trait::async_trait;

/// Query handed to an acquisition strategy.
///
/// `fetch_size` is deliberately larger than the requested quantity so the
/// pipeline can lose records to validation and filtering and still fill the
/// page.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    /// Tribunal identifier, e.g. `TJ-SP`
    pub court: String,
    /// Number of records the caller ultimately wants
    pub quantity: usize,
    /// Filter criteria, pushed down to the source where possible
    pub filter: FilterSpec,
}

impl QuerySpec {
    pub fn new(court: &str, quantity: usize, filter: FilterSpec) -> Self {
        Self {
            court: court.to_string(),
            quantity,
            filter,
        }
    }

    /// Number of candidates to request from the source: twice the target
    /// quantity, so downstream validation and filtering have headroom.
    pub fn fetch_size(&self) -> usize {
        self.quantity * 2
    }
}

/// Raw record as produced by a single acquisition strategy, before
/// normalization.
#[derive(Debug, Clone)]
pub enum RawSourceRecord {
    /// Hit from the DataJud Elasticsearch API
    ApiHit(Box<DatajudProcess>),
    /// Row scraped from the DEPRE consultation table
    ScrapedRow(PortalRow),
    /// Deterministically generated development record
    Synthetic(SyntheticCase),
}

/// A source of raw precatório candidates.
#[async_trait]
pub trait SourceStrategy: Send + Sync {
    /// Fetch raw candidates matching the query.
    async fn fetch_candidates(&self, query: &QuerySpec) -> Result<Vec<RawSourceRecord>>;

    /// Human-readable strategy name for logging
    fn name(&self) -> &str;

    /// Tag recorded on every record this strategy produces
    fn source_tag(&self) -> &str;
}
