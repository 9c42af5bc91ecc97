//! # Query Result Cache
//!
//! In-memory TTL cache for complete search outcomes, keyed by the query
//! parameters. External sources are slow and rate-limited; repeating an
//! identical search within the TTL window serves the previous result.

use crate::pipeline::orchestrator::SearchOutcome;
use crate::pipeline::FilterSpec;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct CacheSlot {
    stored_at: Instant,
    outcome: SearchOutcome,
}

/// TTL cache for search outcomes. A TTL of zero disables caching entirely.
pub struct QueryCache {
    ttl: Duration,
    slots: RwLock<HashMap<String, CacheSlot>>,
}

impl QueryCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_seconds),
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Canonical cache key for a query.
    pub fn key(court: &str, quantity: usize, filter: &FilterSpec) -> String {
        format!(
            "{}|{}|{:?}|{:?}|{:?}|{:?}|{:?}",
            court,
            quantity,
            filter.min_value,
            filter.max_value,
            filter.nature,
            filter.budget_year,
            filter.status
        )
    }

    pub fn get(&self, key: &str) -> Option<SearchOutcome> {
        if self.ttl.is_zero() {
            return None;
        }

        let slots = self.slots.read().ok()?;
        let slot = slots.get(key)?;
        if slot.stored_at.elapsed() > self.ttl {
            return None;
        }
        Some(slot.outcome.clone())
    }

    pub fn put(&self, key: String, outcome: SearchOutcome) {
        if self.ttl.is_zero() {
            return;
        }

        if let Ok(mut slots) = self.slots.write() {
            // opportunistic sweep of expired slots
            slots.retain(|_, slot| slot.stored_at.elapsed() <= self.ttl);
            slots.insert(key, CacheSlot {
                stored_at: Instant::now(),
                outcome,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.slots.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
