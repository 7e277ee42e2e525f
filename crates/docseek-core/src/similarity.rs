//! String similarity scoring with a fixed acceptance gate.
//!
//! Algorithms are injected as [`Similarity`] strategies; the
//! [`SimilarityScorer`] applies the length pre-check, optional phonetic
//! encoding, and the acceptance threshold on top of them.

use crate::phonetic::PhoneticEncoder;

/// Minimum ratio for a candidate to be accepted.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.66;

/// Maximum character-length difference for a pair to be scored at all.
pub const MAX_LENGTH_DIFFERENCE: usize = 1;

/// A string similarity algorithm producing a ratio in `0.0..=1.0`.
pub trait Similarity: Send + Sync {
    /// Short identifier of the algorithm.
    fn name(&self) -> &'static str;

    /// Similarity ratio of two strings; must be symmetric.
    fn ratio(&self, a: &str, b: &str) -> f64;
}

/// Normalized Levenshtein edit distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl Similarity for Levenshtein {
    fn name(&self) -> &'static str {
        "levenshtein"
    }

    fn ratio(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b)
    }
}

/// Jaro similarity: matches within a sliding window, penalized by transpositions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jaro;

impl Similarity for Jaro {
    fn name(&self) -> &'static str {
        "jaro"
    }

    fn ratio(&self, a: &str, b: &str) -> f64 {
        let (a, b) = canonical(a, b);
        strsim::jaro(a, b)
    }
}

/// Jaro-Winkler similarity: Jaro boosted by a shared prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl Similarity for JaroWinkler {
    fn name(&self) -> &'static str {
        "jaro_winkler"
    }

    fn ratio(&self, a: &str, b: &str) -> f64 {
        let (a, b) = canonical(a, b);
        strsim::jaro_winkler(a, b)
    }
}

// Greedy window matching can depend on argument order.
fn canonical<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

// Absorbs rounding in ratios such as 1 - 17/50.
const THRESHOLD_TOLERANCE: f64 = 1e-9;

/// Check whether a ratio reaches the acceptance threshold.
pub fn passes_gate(ratio: f64) -> bool {
    ratio + THRESHOLD_TOLERANCE >= ACCEPTANCE_THRESHOLD
}

/// Scores candidates against check values.
pub struct SimilarityScorer {
    similarity: Box<dyn Similarity>,
    encoder: Box<dyn PhoneticEncoder>,
}

impl SimilarityScorer {
    pub fn new(similarity: Box<dyn Similarity>, encoder: Box<dyn PhoneticEncoder>) -> Self {
        Self {
            similarity,
            encoder,
        }
    }

    /// The injected similarity algorithm.
    pub fn similarity(&self) -> &dyn Similarity {
        self.similarity.as_ref()
    }

    /// The injected phonetic encoder.
    pub fn encoder(&self) -> &dyn PhoneticEncoder {
        self.encoder.as_ref()
    }

    /// Score a candidate against a check value.
    ///
    /// Both sides are trimmed and lowercased, or phonetically encoded when
    /// `phonetic` is set. Returns `None` when the prepared strings differ in
    /// length by more than [`MAX_LENGTH_DIFFERENCE`] characters.
    pub fn score(&self, candidate: &str, check: &str, phonetic: bool) -> Option<f64> {
        if phonetic {
            return self.score_encoded(&self.encoder.codes(candidate), check);
        }
        self.score_prepared(&normalize(candidate), &normalize(check))
    }

    /// Score already encoded candidate codes against every code of the
    /// check value, keeping the best pair.
    pub fn score_encoded(&self, candidate_codes: &[String], check: &str) -> Option<f64> {
        let check_codes = self.encoder.codes(check);
        candidate_codes
            .iter()
            .flat_map(|a| {
                check_codes
                    .iter()
                    .filter_map(move |b| self.score_prepared(a, b))
            })
            .max_by(f64::total_cmp)
    }

    fn score_prepared(&self, a: &str, b: &str) -> Option<f64> {
        let len_a = a.chars().count();
        let len_b = b.chars().count();
        if len_a.abs_diff(len_b) > MAX_LENGTH_DIFFERENCE {
            return None;
        }
        Some(self.similarity.ratio(a, b))
    }

    /// Score and apply the acceptance threshold.
    pub fn accepts(&self, candidate: &str, check: &str, phonetic: bool) -> Option<f64> {
        self.score(candidate, check, phonetic)
            .filter(|ratio| passes_gate(*ratio))
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(Box::new(Levenshtein), Box::new(crate::phonetic::Soundex))
    }
}

impl std::fmt::Debug for SimilarityScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityScorer")
            .field("similarity", &self.similarity.name())
            .field("encoder", &self.encoder.name())
            .finish()
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phonetic::{DaitchMokotoff, Soundex};

    const PAIRS: &[(&str, &str)] = &[
        ("invoice", "invoyce"),
        ("total", "totl"),
        ("martha", "marhta"),
        ("dwayne", "duane"),
        ("crate", "trace"),
        ("abcdef", "badcfe"),
        ("", "a"),
        ("Rechnung", "rechnumg"),
    ];

    fn all_algorithms() -> Vec<Box<dyn Similarity>> {
        vec![Box::new(Levenshtein), Box::new(Jaro), Box::new(JaroWinkler)]
    }

    #[test]
    fn test_ratio_is_symmetric() {
        for algorithm in all_algorithms() {
            for (a, b) in PAIRS {
                assert_eq!(
                    algorithm.ratio(a, b),
                    algorithm.ratio(b, a),
                    "{} not symmetric for {a:?}/{b:?}",
                    algorithm.name()
                );
            }
        }
    }

    #[test]
    fn test_identical_strings_score_one() {
        for algorithm in all_algorithms() {
            assert_eq!(algorithm.ratio("total", "total"), 1.0);
        }
    }

    #[test]
    fn test_winkler_boosts_shared_prefix() {
        let jaro = Jaro.ratio("invoice", "invoixe");
        let winkler = JaroWinkler.ratio("invoice", "invoixe");
        assert!(winkler > jaro);
    }

    #[test]
    fn test_exact_threshold_is_accepted() {
        let scorer = SimilarityScorer::default();
        let check = "a".repeat(50);
        // 17 edits over 50 characters: exactly 0.66
        let at = format!("{}{}", "a".repeat(33), "b".repeat(17));
        let below = format!("{}{}", "a".repeat(32), "b".repeat(18));

        assert!(scorer.accepts(&at, &check, false).is_some());
        assert!(scorer.accepts(&below, &check, false).is_none());
        assert!(passes_gate(ACCEPTANCE_THRESHOLD));
        assert!(!passes_gate(0.6599));
    }

    #[test]
    fn test_length_difference_of_one_is_scored() {
        let scorer = SimilarityScorer::default();
        let ratio = scorer.score("invoice", "invoices", false).unwrap();
        assert!((ratio - 0.875).abs() < 1e-9);
        assert!(scorer.accepts("invoice", "invoices", false).is_some());
    }

    #[test]
    fn test_length_difference_of_two_is_not_scored() {
        let scorer = SimilarityScorer::default();
        assert_eq!(scorer.score("invoice", "invoicess", false), None);
        assert_eq!(scorer.accepts("invoice", "invoicess", false), None);
    }

    #[test]
    fn test_accepts_applies_threshold() {
        let scorer = SimilarityScorer::default();
        // 1 - 1/3 = 0.667
        assert!(scorer.accepts("abc", "abd", false).is_some());
        // 1 - 1/2 = 0.5
        assert!(scorer.accepts("ab", "ac", false).is_none());
    }

    #[test]
    fn test_scoring_ignores_case_and_padding() {
        let scorer = SimilarityScorer::default();
        assert_eq!(scorer.score("  TOTAL ", "total", false), Some(1.0));
    }

    #[test]
    fn test_phonetic_scoring_uses_codes() {
        let scorer = SimilarityScorer::new(Box::new(Levenshtein), Box::new(Soundex));
        // Both encode to R163.
        assert_eq!(scorer.score("Robert", "Rupert", true), Some(1.0));
        assert!(scorer.score("Robert", "Rupert", false).unwrap() < 1.0);
        assert_eq!(scorer.score_encoded(&["R163".to_string()], "Rupert"), Some(1.0));
    }

    #[test]
    fn test_phonetic_scoring_keeps_best_branch() {
        let scorer = SimilarityScorer::new(Box::new(Levenshtein), Box::new(DaitchMokotoff));
        // Cicic branches include 444000; its primary code 555000 is far off.
        assert_eq!(scorer.score("Cicic", "Tschitschitsch", true), Some(1.0));
        assert_eq!(
            scorer.score_encoded(&["555000".to_string()], "Tschitschitsch"),
            Some(0.5)
        );
    }
}
