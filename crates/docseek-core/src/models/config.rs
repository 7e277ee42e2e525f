//! Configuration structures for the extraction engine.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::phonetic::{DaitchMokotoff, PhoneticEncoder, Soundex};
use crate::similarity::{Jaro, JaroWinkler, Levenshtein, Similarity};
use crate::value::Language;

/// Main configuration for the docseek engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Similarity scoring configuration.
    pub similarity: SimilarityConfig,

    /// Phonetic encoding configuration.
    pub phonetic: PhoneticConfig,

    /// Spatial partition configuration.
    pub grid: GridConfig,

    /// Number and date normalization.
    pub locale: LocaleConfig,
}

/// Available string similarity algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityAlgorithm {
    /// Normalized edit distance.
    #[default]
    Levenshtein,
    /// Match-window ratio with transposition penalty.
    Jaro,
    /// Jaro with a common-prefix boost.
    JaroWinkler,
}

impl SimilarityAlgorithm {
    /// Build the scoring strategy for this algorithm.
    pub fn strategy(&self) -> Box<dyn Similarity> {
        match self {
            SimilarityAlgorithm::Levenshtein => Box::new(Levenshtein),
            SimilarityAlgorithm::Jaro => Box::new(Jaro),
            SimilarityAlgorithm::JaroWinkler => Box::new(JaroWinkler),
        }
    }
}

/// Similarity scoring configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Algorithm used to compare candidates against check values.
    pub algorithm: SimilarityAlgorithm,
}

/// Available phonetic encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneticAlgorithm {
    /// Four-character American Soundex.
    #[default]
    Soundex,
    /// Six-digit Daitch-Mokotoff Soundex with branching.
    DaitchMokotoff,
}

impl PhoneticAlgorithm {
    /// Build the encoder for this algorithm.
    pub fn encoder(&self) -> Box<dyn PhoneticEncoder> {
        match self {
            PhoneticAlgorithm::Soundex => Box::new(Soundex),
            PhoneticAlgorithm::DaitchMokotoff => Box::new(DaitchMokotoff),
        }
    }
}

/// Phonetic encoding configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneticConfig {
    /// Encoder applied to fields in phonetic mode.
    pub algorithm: PhoneticAlgorithm,
}

/// Spatial partition configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of horizontal bands.
    pub rows: usize,

    /// Number of vertical bands.
    pub cols: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { rows: 3, cols: 3 }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::InvalidGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }
}

/// Order of day, month and year in numeric dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    #[default]
    DayMonthYear,
    MonthDayYear,
    YearMonthDay,
}

/// Locale used to normalize numbers and dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Decimal separator of normalized numbers.
    pub decimal_separator: char,

    /// Order of numeric date components in source documents.
    pub date_order: DateOrder,

    /// chrono format string for normalized dates.
    pub date_format: String,

    /// Languages whose month names are recognized.
    pub languages: Vec<Language>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            date_order: DateOrder::DayMonthYear,
            date_format: "%m/%d/%Y".to_string(),
            languages: Language::ALL.to_vec(),
        }
    }
}

impl EngineConfig {
    /// Check settings that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
