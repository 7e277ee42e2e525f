//! Matching primitives: line contents, the undefined-field scan and cells.

use std::collections::HashMap;

use regex::Regex;
use tracing::trace;

use crate::error::SearchError;
use crate::layout::{TextModel, TextUnit};
use crate::similarity::{SimilarityScorer, passes_gate};

/// Compiled patterns keyed by source text.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: HashMap<String, Regex>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a pattern once; failures name the owning field.
    pub fn get(&mut self, field: &str, pattern: &str) -> Result<Regex, SearchError> {
        if let Some(re) = self.compiled.get(pattern) {
            return Ok(re.clone());
        }
        trace!("Compiling pattern {:?} for field {}", pattern, field);
        let re = Regex::new(pattern).map_err(|source| SearchError::Pattern {
            field: field.to_string(),
            pattern: pattern.to_string(),
            source,
        })?;
        self.compiled.insert(pattern.to_string(), re.clone());
        Ok(re)
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

/// Values of every match in `text`: each participating capture group, or
/// the whole match when no group took part.
pub fn match_values(re: &Regex, text: &str) -> Vec<String> {
    let mut values = Vec::new();
    for caps in re.captures_iter(text) {
        let groups: Vec<&str> = caps.iter().skip(1).flatten().map(|m| m.as_str()).collect();
        if groups.is_empty() {
            values.push(caps[0].to_string());
        } else {
            values.extend(groups.into_iter().map(str::to_string));
        }
    }
    values
}

/// A unit that matched: its accepted values joined by `|` and its position.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentMatch {
    pub value: String,
    pub x: f64,
}

/// A candidate anchor found by the undefined-field scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub line: u32,
    pub x: f64,
    pub value: String,
    pub score: f64,
}

/// Applies patterns and the similarity gate to text.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    scorer: &'a SimilarityScorer,
}

impl<'a> Matcher<'a> {
    pub fn new(scorer: &'a SimilarityScorer) -> Self {
        Self { scorer }
    }

    /// Find the first unit, left to right, holding an acceptable match.
    ///
    /// Without a check value any match is acceptable. With one, a match must
    /// pass the similarity gate.
    pub fn test_contents(
        &self,
        units: &[TextUnit],
        re: &Regex,
        check: Option<&str>,
        phonetic: bool,
    ) -> Option<ContentMatch> {
        units.iter().find_map(|unit| {
            let accepted: Vec<String> = match_values(re, &unit.text)
                .into_iter()
                .filter(|value| self.score(unit, value, check, phonetic).is_some())
                .collect();
            (!accepted.is_empty()).then(|| ContentMatch {
                value: accepted.join("|"),
                x: unit.x,
            })
        })
    }

    /// Scan every unit of every line and keep only the best-scoring matches.
    ///
    /// Ties are all kept, one candidate per distinct unit position.
    pub fn scan_undefined(
        &self,
        text: &TextModel,
        re: &Regex,
        check: Option<&str>,
        phonetic: bool,
    ) -> Vec<Candidate> {
        let mut best: Vec<Candidate> = Vec::new();
        for (line, units) in text.lines() {
            for unit in units {
                for value in match_values(re, &unit.text) {
                    let Some(score) = self.score(unit, &value, check, phonetic) else {
                        continue;
                    };
                    let top = best.first().map_or(f64::NEG_INFINITY, |c| c.score);
                    if score > top {
                        best.clear();
                    } else if score < top {
                        continue;
                    }
                    if best.iter().any(|c| c.line == line && c.x == unit.x) {
                        continue;
                    }
                    best.push(Candidate {
                        line,
                        x: unit.x,
                        value,
                        score,
                    });
                }
            }
        }
        best
    }

    /// First acceptable match inside a single cell.
    pub fn match_cell(
        &self,
        content: &str,
        re: &Regex,
        check: Option<&str>,
        phonetic: bool,
    ) -> Option<String> {
        match_values(re, content).into_iter().find(|value| {
            check.is_none_or(|check| self.accepts(value, check, phonetic))
        })
    }

    fn score(
        &self,
        unit: &TextUnit,
        value: &str,
        check: Option<&str>,
        phonetic: bool,
    ) -> Option<f64> {
        let Some(check) = check else {
            return Some(1.0);
        };
        let stored = phonetic && !unit.phonetic.is_empty() && value.trim() == unit.text.trim();
        let score = if stored {
            self.scorer.score_encoded(&unit.phonetic, check)
        } else {
            self.scorer.score(value, check, phonetic)
        };
        score.filter(|s| passes_gate(*s))
    }

    fn accepts(&self, value: &str, check: &str, phonetic: bool) -> bool {
        self.scorer.accepts(value, check, phonetic).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phonetic::Soundex;
    use pretty_assertions::assert_eq;

    fn units(texts: &[(&str, f64)]) -> Vec<TextUnit> {
        texts.iter().map(|(t, x)| TextUnit::new(*t, *x, 0.0)).collect()
    }

    #[test]
    fn test_pattern_cache_reports_field() {
        let mut cache = PatternCache::new();
        assert!(cache.get("Total", r"Total:\s*(\d+)").is_ok());
        assert!(cache.get("Total", r"Total:\s*(\d+)").is_ok());
        assert_eq!(cache.len(), 1);

        let err = cache.get("Broken", "(unclosed").unwrap_err();
        assert!(matches!(err, SearchError::Pattern { ref field, .. } if field == "Broken"));
    }

    #[test]
    fn test_match_values_groups_and_whole() {
        let groups = Regex::new(r"(\d+)-(\d+)").unwrap();
        assert_eq!(match_values(&groups, "1-2 and 3-4"), vec!["1", "2", "3", "4"]);
        let whole = Regex::new(r"\d+").unwrap();
        assert_eq!(match_values(&whole, "a 12 b 7"), vec!["12", "7"]);
    }

    #[test]
    fn test_contents_without_check_takes_first_unit() {
        let scorer = SimilarityScorer::default();
        let matcher = Matcher::new(&scorer);
        let re = Regex::new(r"\d+").unwrap();
        let line = units(&[("Total", 0.0), ("12 30", 50.0), ("99", 90.0)]);
        let found = matcher.test_contents(&line, &re, None, false).unwrap();
        assert_eq!(found, ContentMatch { value: "12|30".into(), x: 50.0 });
    }

    #[test]
    fn test_contents_with_check_is_first_acceptable() {
        let scorer = SimilarityScorer::default();
        let matcher = Matcher::new(&scorer);
        let re = Regex::new(r"[A-Za-z]+").unwrap();
        // "Totl" passes (0.8) before the exact "Total" further right.
        let found = matcher
            .test_contents(
                &units(&[("Sum", 0.0), ("Totl", 40.0), ("Total", 80.0)]),
                &re,
                Some("Total"),
                false,
            )
            .unwrap();
        assert_eq!(found.x, 40.0);
        assert_eq!(found.value, "Totl");
    }

    #[test]
    fn test_scan_keeps_global_maximum_and_ties() {
        let scorer = SimilarityScorer::default();
        let matcher = Matcher::new(&scorer);
        let text = TextModel::from_text("Totl\nTotal\nNothing\nTotal  Total");
        let re = Regex::new(r"[A-Za-z]+").unwrap();

        let found = matcher.scan_undefined(&text, &re, Some("Total"), false);
        let positions: Vec<(u32, f64)> = found.iter().map(|c| (c.line, c.x)).collect();
        assert_eq!(positions, vec![(2, 0.0), (4, 0.0), (4, 7.0)]);
        assert!(found.iter().all(|c| c.score == 1.0));
    }

    #[test]
    fn test_scan_without_acceptable_match_is_empty() {
        let scorer = SimilarityScorer::default();
        let matcher = Matcher::new(&scorer);
        let text = TextModel::from_text("Invoice\nDate");
        let re = Regex::new(r"\w+").unwrap();
        assert!(matcher.scan_undefined(&text, &re, Some("Total"), false).is_empty());
    }

    #[test]
    fn test_phonetic_uses_stored_code() {
        let scorer = SimilarityScorer::default();
        let matcher = Matcher::new(&scorer);
        let mut text = TextModel::from_text("Rupert");
        text.encode_phonetic(&Soundex);
        let re = Regex::new(r"\w+").unwrap();

        let found = matcher.scan_undefined(&text, &re, Some("Robert"), true);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].score, 1.0);
        assert!(matcher.scan_undefined(&text, &re, Some("Robert"), false)[0].score < 1.0);
    }

    #[test]
    fn test_contents_accepts_exact_threshold() {
        let scorer = SimilarityScorer::default();
        let matcher = Matcher::new(&scorer);
        let check = "a".repeat(50);
        let unit = format!("{}{}", "a".repeat(33), "b".repeat(17));
        let re = Regex::new(r"\w+").unwrap();

        let line = units(&[(unit.as_str(), 0.0)]);
        let found = matcher.test_contents(&line, &re, Some(check.as_str()), false);
        assert_eq!(found.map(|m| m.value), Some(unit));
    }

    #[test]
    fn test_match_cell() {
        let scorer = SimilarityScorer::default();
        let matcher = Matcher::new(&scorer);
        let re = Regex::new(r"(?i)amount").unwrap();
        assert_eq!(matcher.match_cell("Amount", &re, Some("amount"), false), Some("Amount".into()));
        assert_eq!(matcher.match_cell("Qty", &re, Some("amount"), false), None);
    }
}
