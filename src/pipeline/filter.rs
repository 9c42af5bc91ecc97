//! # Filter Engine
//!
//! Applies a user-specified predicate set over normalized records. All
//! predicates are optional and combined with logical AND; input order is
//! preserved. A claim value of zero means "unknown" and bypasses the value
//! range predicates so records whose value could not be extracted are not
//! silently discarded.

use crate::{CaseRecord, CaseStatus, Nature};
use serde::{Deserialize, Serialize};

/// Optional filter criteria for a search. `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub nature: Option<Nature>,
    pub budget_year: Option<i32>,
    pub status: Option<CaseStatus>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn matches(&self, record: &CaseRecord) -> bool {
        if record.claim_value > 0.0 {
            if let Some(min) = self.min_value {
                if record.claim_value < min {
                    return false;
                }
            }
            if let Some(max) = self.max_value {
                if record.claim_value > max {
                    return false;
                }
            }
        }

        if let Some(nature) = self.nature {
            if record.nature != nature {
                return false;
            }
        }
        if let Some(year) = self.budget_year {
            if record.budget_year != year {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }

        true
    }
}

/// Apply the filter, preserving input order.
pub fn apply_filters(records: Vec<CaseRecord>, spec: &FilterSpec) -> Vec<CaseRecord> {
    if spec.is_empty() {
        return records;
    }
    records.into_iter().filter(|r| spec.matches(r)).collect()
}
