//! Confidence re-scoring against the recognized evidence text.
//!
//! The model reports its own confidence per field, but that number is not
//! grounded in what the OCR actually saw — a model can be confidently wrong
//! about text that never appeared on the page. [`calculate_confidence_score`]
//! recomputes confidence from the evidence text alone and the orchestration
//! layer overwrites the model-reported value with it.

use crate::output::NOT_FOUND;
use once_cell::sync::Lazy;
use regex::Regex;

// SSN-style 3-2-4 digit grouping, e.g. 123-45-6789.
static SSN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{3}-\d{2}-\d{4}").expect("valid regex"));

// EIN-style 2-7 digit grouping, e.g. 12-3456789.
static EIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}-\d{7}").expect("valid regex"));

/// Recompute a 0.0–1.0 confidence for `value` against `evidence_text`.
///
/// Scoring: empty or sentinel values score 0.0. Otherwise start from a 0.5
/// base, add 0.3 when the value appears case-insensitively in the evidence
/// text, add 0.2 when the value matches a recognized format, and clamp to 1.0.
///
/// A value present verbatim in the evidence therefore scores at least 0.8;
/// a well-formatted value absent from the evidence scores 0.7.
pub fn calculate_confidence_score(value: &str, evidence_text: &str) -> f64 {
    if value.is_empty() || value == NOT_FOUND {
        return 0.0;
    }

    let mut confidence: f64 = 0.5;

    if evidence_text.to_lowercase().contains(&value.to_lowercase()) {
        confidence += 0.3;
    }

    if is_properly_formatted(value) {
        confidence += 0.2;
    }

    confidence.min(1.0)
}

/// Whether `value` matches one of the recognized field formats.
///
/// The last check deliberately accepts any non-blank text: plain-text fields
/// (employer names, states) have no canonical format, so they still earn the
/// format bonus. The earlier checks exist to document which shapes count as
/// well-formed, and to keep whitespace-only values from earning the bonus.
fn is_properly_formatted(value: &str) -> bool {
    // Monetary: currency symbol plus at least one digit.
    if value.contains('$') && value.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }

    if SSN_RE.is_match(value) {
        return true;
    }

    if EIN_RE.is_match(value) {
        return true;
    }

    !value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVIDENCE: &str = "--- Page 1 ---\nEmployer: Acme Corp\nWages: $52,000.00\nEIN: 12-3456789";

    #[test]
    fn sentinel_and_empty_score_zero() {
        assert_eq!(calculate_confidence_score(NOT_FOUND, EVIDENCE), 0.0);
        assert_eq!(calculate_confidence_score("", EVIDENCE), 0.0);
        assert_eq!(calculate_confidence_score("", ""), 0.0);
    }

    #[test]
    fn verbatim_value_scores_at_least_point_eight() {
        let score = calculate_confidence_score("Acme Corp", EVIDENCE);
        assert!(score >= 0.8, "got {score}");
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let score = calculate_confidence_score("ACME CORP", EVIDENCE);
        assert!(score >= 0.8, "got {score}");
    }

    #[test]
    fn currency_value_absent_from_evidence_scores_point_seven() {
        let score = calculate_confidence_score("$45,000", EVIDENCE);
        assert!((score - 0.7).abs() < f64::EPSILON, "got {score}");
    }

    #[test]
    fn present_and_formatted_is_clamped_to_one() {
        // 0.5 base + 0.3 substring + 0.2 format = 1.0 exactly; the cap keeps
        // any future bonus stacking inside the closed interval.
        let score = calculate_confidence_score("$52,000.00", EVIDENCE);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn score_is_always_in_unit_interval() {
        for value in ["Acme Corp", "$52,000.00", "12-3456789", "123-45-6789", "x", "  "] {
            for evidence in [EVIDENCE, "", "unrelated"] {
                let score = calculate_confidence_score(value, evidence);
                assert!((0.0..=1.0).contains(&score), "{value:?} vs {evidence:?} → {score}");
            }
        }
    }

    #[test]
    fn ssn_and_ein_groupings_are_recognized() {
        assert!(is_properly_formatted("123-45-6789"));
        assert!(is_properly_formatted("12-3456789"));
        // 2-2-4 grouping matches neither pattern but is still non-blank text.
        assert!(is_properly_formatted("12-45-6789"));
    }

    #[test]
    fn whitespace_only_value_earns_no_format_bonus() {
        assert!(!is_properly_formatted("   "));
        // Not the sentinel and not empty, so it still gets the 0.5 base.
        assert_eq!(calculate_confidence_score("   ", "unrelated"), 0.5);
    }
}
