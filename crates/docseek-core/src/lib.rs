//! Core library for locating named field values in positioned document text.
//!
//! This crate provides:
//! - A declarative field configuration (pattern chains with line or cell offsets)
//! - A positioned-text, table and grid model of a document
//! - A search-tree matching engine with fuzzy anchors and nearby-line recovery
//! - String similarity and phonetic encoding (Soundex, Daitch-Mokotoff)
//! - Typed value normalization for strings, numbers and dates

pub mod error;
pub mod extractor;
pub mod layout;
pub mod models;
pub mod phonetic;
pub mod search;
pub mod similarity;
pub mod value;

pub use error::{DocseekError, Result};
pub use extractor::{ExtractionResult, FieldExtractor, FieldValues, collect_values};
pub use layout::{Document, GridPartition, Table, TableCell, TextModel, TextUnit};
pub use models::{EngineConfig, Expression, FieldConfig, FieldSpec, ValueType};
pub use phonetic::{DaitchMokotoff, PhoneticEncoder, Soundex};
pub use search::{NodeId, NodeLabel, SearchEngine, SearchTree};
pub use similarity::{Similarity, SimilarityScorer};
pub use value::{ExtractedValue, Language, ValueExtractor};
