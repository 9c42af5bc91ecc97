//! # Case Number Validator
//!
//! Deliberately lenient: the rule accepts both the dotted/dashed CNJ format
//! and raw digit strings, so records from the API and from portal scrapes
//! pass the same gate. Tightening it would drop real records whose
//! formatting drifts from the standard.

use crate::utils::strip_non_digits;

const MIN_LENGTH: usize = 15;
const MIN_DIGITS: usize = 20;

/// A case number is valid when it is non-empty, at least 15 characters in
/// its original form, and carries at least 20 digits.
pub fn is_valid_case_number(case_number: &str) -> bool {
    let trimmed = case_number.trim();
    trimmed.len() >= MIN_LENGTH && strip_non_digits(trimmed).len() >= MIN_DIGITS
}
