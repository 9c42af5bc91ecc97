//! # Storage Module
//!
//! ## Purpose
//! Embedded persistence for imported case records using sled with bincode
//! serialization. Records are keyed by court and case number so a re-import
//! for one court can atomically replace that court's records without
//! touching the others.
//!
//! ## Key Layout
//! `{court}\x00{case_number}` — the NUL separator never appears in either
//! component, so prefix scans per court are unambiguous.

use crate::errors::{PrecatorioError, Result};
use crate::CaseRecord;
use std::path::Path;

const KEY_SEPARATOR: u8 = 0;

/// Persistent record store.
pub struct Storage {
    db: sled::Db,
}

impl Storage {
    /// Open (or create) the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PrecatorioError::DatabaseConnectionFailed {
                    db_path: path.display().to_string(),
                    reason: format!("Cannot create data directory: {}", e),
                }
            })?;
        }

        let db = sled::open(path).map_err(|e| PrecatorioError::DatabaseConnectionFailed {
            db_path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { db })
    }

    fn record_key(court: &str, case_number: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(court.len() + 1 + case_number.len());
        key.extend_from_slice(court.as_bytes());
        key.push(KEY_SEPARATOR);
        key.extend_from_slice(case_number.as_bytes());
        key
    }

    fn court_prefix(court: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(court.len() + 1);
        prefix.extend_from_slice(court.as_bytes());
        prefix.push(KEY_SEPARATOR);
        prefix
    }

    fn decode(bytes: &[u8]) -> Result<CaseRecord> {
        bincode::deserialize(bytes).map_err(|e| PrecatorioError::SerializationFailed {
            message: format!("Corrupt stored record: {}", e),
        })
    }

    /// Replace every stored record for a court with the given set in one
    /// atomic batch, so readers never observe an empty court mid-import.
    pub fn replace_court_records(&self, court: &str, records: &[CaseRecord]) -> Result<usize> {
        let mut batch = sled::Batch::default();

        for entry in self.db.scan_prefix(Self::court_prefix(court)) {
            let (key, _) = entry?;
            batch.remove(key);
        }

        for record in records {
            let bytes =
                bincode::serialize(record).map_err(|e| PrecatorioError::SerializationFailed {
                    message: format!("Cannot encode record {}: {}", record.case_number, e),
                })?;
            batch.insert(Self::record_key(court, &record.case_number), bytes);
        }

        self.db.apply_batch(batch)?;
        self.db.flush()?;

        tracing::info!("Stored {} records for {}", records.len(), court);
        Ok(records.len())
    }

    /// List stored records, optionally restricted to one court.
    pub fn list_records(&self, court: Option<&str>) -> Result<Vec<CaseRecord>> {
        let mut records = Vec::new();

        match court {
            Some(court) => {
                for entry in self.db.scan_prefix(Self::court_prefix(court)) {
                    let (_, value) = entry?;
                    records.push(Self::decode(&value)?);
                }
            }
            None => {
                for entry in self.db.iter() {
                    let (_, value) = entry?;
                    records.push(Self::decode(&value)?);
                }
            }
        }

        Ok(records)
    }

    /// Total number of stored records.
    pub fn record_count(&self) -> usize {
        self.db.len()
    }

    /// Verify the database responds to a write and a read.
    pub fn health_check(&self) -> Result<()> {
        let key = b"__health_check__";
        self.db.insert(key, b"ok")?;
        self.db.remove(key)?;
        Ok(())
    }
}
