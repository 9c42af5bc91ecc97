//! # Nature Classifier
//!
//! Keyword-based classification of a case's legal nature, which determines
//! its payment priority. Class and subject text are concatenated and
//! lowercased, then tested against ordered keyword groups; the first group
//! that matches wins, so text mentioning both food support and taxes still
//! classifies as Alimentar.

use crate::Nature;

const ALIMENTAR: &[&str] = &["aliment", "pensão", "salário"];
const TRIBUTARIA: &[&str] = &["tribut", "fiscal", "iptu"];
const PREVIDENCIARIA: &[&str] = &["previd", "benefício"];

/// Classify a case from its class name and subject names.
pub fn classify(case_class: &str, subjects: &[&str]) -> Nature {
    let mut haystack = case_class.to_lowercase();
    for subject in subjects {
        haystack.push(' ');
        haystack.push_str(&subject.to_lowercase());
    }

    for (keywords, nature) in [
        (ALIMENTAR, Nature::Alimentar),
        (TRIBUTARIA, Nature::Tributaria),
        (PREVIDENCIARIA, Nature::Previdenciaria),
    ] {
        if keywords.iter().any(|k| haystack.contains(k)) {
            return nature;
        }
    }

    Nature::Comum
}
