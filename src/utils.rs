//! # Utility Functions Module
//!
//! ## Purpose
//! Shared helpers used across the acquisition and pipeline layers: Brazilian
//! monetary parsing, digit extraction, and a lightweight operation timer.
//!
//! ## Input/Output Specification
//! - **Input**: raw strings scraped or returned by external sources
//! - **Output**: normalized numeric values and digit-only identifiers
//! - **Guarantees**: all parsers are total; malformed input maps to a
//!   neutral value rather than an error

use std::time::Instant;

/// Parse a Brazilian-formatted monetary string into a value in reais.
///
/// Accepts strings like `"R$ 1.234.567,89"`, `"1.234,56"` or plain
/// `"1234.56"`. Thousands separators are dots, the decimal separator is a
/// comma. Returns `0.0` for anything that does not contain a number.
pub fn parse_monetary_value(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    if cleaned.is_empty() {
        return 0.0;
    }

    let normalized = if cleaned.contains(',') {
        // Brazilian format: dots are thousands separators, comma is decimal
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    normalized.parse::<f64>().unwrap_or(0.0).max(0.0)
}

/// Strip every non-digit character from a string.
pub fn strip_non_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Format a value in reais in Brazilian notation, e.g. `R$ 1.234.567,89`.
pub fn format_monetary_value(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, frac)
}

/// Simple timer for measuring operation durations.
pub struct Timer {
    start: Instant,
    operation: String,
}

impl Timer {
    /// Start timing an operation
    pub fn new(operation: &str) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.to_string(),
        }
    }

    /// Elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Log the elapsed time at debug level
    pub fn finish(self) -> u64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!("{} completed in {}ms", self.operation, elapsed);
        elapsed
    }
}
