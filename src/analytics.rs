//! # Analytics Module
//!
//! ## Purpose
//! Aggregate statistics over stored case records for the dashboard: value
//! summary, breakdowns by nature, status, budget year and court, value
//! bands, and the largest claims. All computations run over the in-memory
//! record list handed in by the caller.

use crate::{CaseRecord, CaseStatus, Nature};
use serde::Serialize;
use std::collections::BTreeMap;

/// Value summary of a record collection. Zero claim values mean "unknown"
/// and are excluded from the monetary aggregates.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSummary {
    pub total: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Records with a known (non-zero) value
    pub known_count: usize,
}

/// One value band with its record count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueBand {
    pub label: &'static str,
    pub count: usize,
}

/// Count and summed claim value of one grouping bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub count: usize,
    pub total_value: f64,
}

impl GroupStats {
    fn add(&mut self, claim_value: f64) {
        self.count += 1;
        self.total_value += claim_value;
    }
}

/// Complete dashboard payload.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub record_count: usize,
    pub values: ValueSummary,
    pub by_nature: BTreeMap<String, GroupStats>,
    pub by_status: BTreeMap<String, GroupStats>,
    pub by_budget_year: BTreeMap<i32, GroupStats>,
    pub by_court: BTreeMap<String, GroupStats>,
    pub value_bands: Vec<ValueBand>,
    pub top_claims: Vec<TopClaim>,
}

/// Condensed view of a high-value record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopClaim {
    pub case_number: String,
    pub creditor: String,
    pub claim_value: f64,
    pub nature: Nature,
    pub status: CaseStatus,
}

const BANDS: &[(&str, f64, f64)] = &[
    ("até R$ 10 mil", 0.0, 10_000.0),
    ("R$ 10 mil a R$ 50 mil", 10_000.0, 50_000.0),
    ("R$ 50 mil a R$ 100 mil", 50_000.0, 100_000.0),
    ("R$ 100 mil a R$ 500 mil", 100_000.0, 500_000.0),
    ("acima de R$ 500 mil", 500_000.0, f64::INFINITY),
];

const TOP_CLAIMS: usize = 10;

fn value_summary(records: &[CaseRecord]) -> ValueSummary {
    let mut known: Vec<f64> = records
        .iter()
        .map(|r| r.claim_value)
        .filter(|v| *v > 0.0)
        .collect();

    if known.is_empty() {
        return ValueSummary::default();
    }

    known.sort_by(|a, b| a.total_cmp(b));
    let total: f64 = known.iter().sum();
    let mid = known.len() / 2;
    let median = if known.len() % 2 == 0 {
        (known[mid - 1] + known[mid]) / 2.0
    } else {
        known[mid]
    };

    ValueSummary {
        total,
        mean: total / known.len() as f64,
        median,
        min: known[0],
        max: known[known.len() - 1],
        known_count: known.len(),
    }
}

fn value_bands(records: &[CaseRecord]) -> Vec<ValueBand> {
    BANDS
        .iter()
        .map(|(label, lo, hi)| ValueBand {
            label,
            count: records
                .iter()
                .filter(|r| r.claim_value > 0.0 && r.claim_value > *lo && r.claim_value <= *hi)
                .count(),
        })
        .collect()
}

fn top_claims(records: &[CaseRecord]) -> Vec<TopClaim> {
    let mut sorted: Vec<&CaseRecord> = records.iter().filter(|r| r.claim_value > 0.0).collect();
    sorted.sort_by(|a, b| b.claim_value.total_cmp(&a.claim_value));
    sorted
        .into_iter()
        .take(TOP_CLAIMS)
        .map(|r| TopClaim {
            case_number: r.case_number.clone(),
            creditor: r.creditor.clone(),
            claim_value: r.claim_value,
            nature: r.nature,
            status: r.status,
        })
        .collect()
}

/// Compute the full dashboard payload over a record collection.
pub fn compute_dashboard(records: &[CaseRecord]) -> DashboardStats {
    let mut by_nature = BTreeMap::new();
    let mut by_status = BTreeMap::new();
    let mut by_budget_year = BTreeMap::new();
    let mut by_court = BTreeMap::new();

    for record in records {
        by_nature
            .entry(record.nature.to_string())
            .or_insert_with(GroupStats::default)
            .add(record.claim_value);
        by_status
            .entry(record.status.to_string())
            .or_insert_with(GroupStats::default)
            .add(record.claim_value);
        by_budget_year
            .entry(record.budget_year)
            .or_insert_with(GroupStats::default)
            .add(record.claim_value);
        by_court
            .entry(record.court.clone())
            .or_insert_with(GroupStats::default)
            .add(record.claim_value);
    }

    DashboardStats {
        record_count: records.len(),
        values: value_summary(records),
        by_nature,
        by_status,
        by_budget_year,
        by_court,
        value_bands: value_bands(records),
        top_claims: top_claims(records),
    }
}
