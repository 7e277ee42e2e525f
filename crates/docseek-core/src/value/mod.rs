//! Typed value extraction from regex matches.

pub mod dates;
pub mod numbers;
pub mod patterns;

use std::fmt;

use regex::Captures;
use serde::{Deserialize, Serialize};

use crate::models::{LocaleConfig, ScalarType};

/// Languages with month-name dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    German,
    French,
    Spanish,
    Italian,
    Dutch,
    Polish,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::English,
        Language::German,
        Language::French,
        Language::Spanish,
        Language::Italian,
        Language::Dutch,
        Language::Polish,
    ];
}

/// Outcome of converting a match to its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ExtractedValue {
    /// Normalized value.
    Valid(String),
    /// Explanatory placeholder for a value that failed conversion.
    Invalid(String),
}

impl ExtractedValue {
    pub fn as_str(&self) -> &str {
        match self {
            ExtractedValue::Valid(s) | ExtractedValue::Invalid(s) => s,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ExtractedValue::Valid(_))
    }
}

impl fmt::Display for ExtractedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts raw matches into typed values.
#[derive(Debug, Clone, Default)]
pub struct ValueExtractor {
    locale: LocaleConfig,
}

impl ValueExtractor {
    pub fn new(locale: LocaleConfig) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> &LocaleConfig {
        &self.locale
    }

    /// Convert a match: the first participating group, or the whole match.
    pub fn extract(&self, caps: &Captures<'_>, scalar: ScalarType) -> ExtractedValue {
        let raw = caps
            .iter()
            .skip(1)
            .flatten()
            .next()
            .or_else(|| caps.get(0))
            .map_or("", |m| m.as_str());
        self.extract_str(raw, scalar)
    }

    /// Convert raw text.
    pub fn extract_str(&self, raw: &str, scalar: ScalarType) -> ExtractedValue {
        match scalar {
            ScalarType::String => ExtractedValue::Valid(raw.trim().to_string()),
            ScalarType::Number => numbers::normalize_number(raw, self.locale.decimal_separator),
            ScalarType::Date => dates::normalize_date(raw, &self.locale),
        }
    }
}
