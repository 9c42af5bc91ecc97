//! # Normalization Pipeline Module
//!
//! ## Purpose
//! Pure transformation stages that turn raw source records into validated,
//! classified `CaseRecord`s, plus the orchestrator that wires the stages to
//! the acquisition strategies and collects per-stage statistics.
//!
//! ## Stage Order
//! acquisition → normalize → validate → classify → filter → truncate
//!
//! Every stage except acquisition is synchronous and side-effect-free; each
//! record is processed independently.

pub mod cache;
pub mod classify;
pub mod filter;
pub mod normalize;
pub mod orchestrator;
pub mod validate;

pub use cache::QueryCache;
pub use filter::{apply_filters, FilterSpec};
pub use orchestrator::{PipelineStats, SearchOutcome, SearchPipeline};
