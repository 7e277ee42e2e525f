//! Field extraction facade: configuration in, field values out.

use std::time::Instant;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, info};

use crate::error::Result;
use crate::layout::{Document, Table, TextModel};
use crate::models::{EngineConfig, FieldConfig};
use crate::search::{SearchEngine, SearchTree};
use crate::similarity::SimilarityScorer;
use crate::value::ValueExtractor;

/// Field values in configuration order.
///
/// Every configured field is present; fields without a match hold an empty
/// string. Multiple values are joined by `|`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues(Vec<(String, String)>);

impl FieldValues {
    /// Value of a field, if the field was configured.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of fields that found nothing.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, v)| v.is_empty()).map(|(k, _)| k)
    }
}

impl Serialize for FieldValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, value) in &self.0 {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

/// Result of extracting fields from one document.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted values.
    pub values: FieldValues,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Extracts configured fields from documents.
#[derive(Debug)]
pub struct FieldExtractor {
    config: EngineConfig,
    scorer: SimilarityScorer,
    values: ValueExtractor,
}

impl FieldExtractor {
    /// Create an extractor; the similarity strategy and phonetic encoder are
    /// chosen from the configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let scorer = SimilarityScorer::new(
            config.similarity.algorithm.strategy(),
            config.phonetic.algorithm.encoder(),
        );
        let values = ValueExtractor::new(config.locale.clone());
        Ok(Self {
            config,
            scorer,
            values,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a document with this extractor's grid and phonetic codes.
    pub fn prepare(&self, text: TextModel, tables: Vec<Table>) -> Result<Document> {
        let document = Document::new(text, tables, &self.config.grid)?;
        Ok(document.with_phonetic(self.scorer.encoder())?)
    }

    /// Populate and resolve the search tree for a document.
    pub fn resolve(&self, fields: &FieldConfig, document: &Document) -> Result<SearchTree> {
        fields.validate()?;
        let tree = SearchTree::populate(&fields.fields)?;
        let mut engine = SearchEngine::new(tree, &self.scorer, &self.values);
        engine.resolve_all(fields, document)?;
        Ok(engine.into_tree())
    }

    /// Extract every configured field from a document.
    pub fn extract(&self, fields: &FieldConfig, document: &Document) -> Result<ExtractionResult> {
        let start = Instant::now();
        info!(
            "Extracting {} fields from {} lines and {} tables",
            fields.fields.len(),
            document.text().line_count(),
            document.tables().len()
        );

        let tree = self.resolve(fields, document)?;
        let values = collect_values(&tree, fields);

        let warnings: Vec<String> = values
            .missing()
            .map(|field| format!("Could not extract {field}"))
            .collect();

        debug!(
            "Extracted {} of {} fields using {} tree nodes",
            values.len() - warnings.len(),
            values.len(),
            tree.len()
        );

        Ok(ExtractionResult {
            values,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            values: ValueExtractor::new(config.locale.clone()),
            scorer: SimilarityScorer::default(),
            config,
        }
    }
}

/// Collect the value of every configured field from a resolved tree.
pub fn collect_values(tree: &SearchTree, fields: &FieldConfig) -> FieldValues {
    FieldValues(
        fields
            .fields
            .iter()
            .map(|spec| {
                let value = tree
                    .field_node(&spec.name)
                    .map(|field| tree.field_value(field))
                    .unwrap_or_default();
                (spec.name.clone(), value)
            })
            .collect(),
    )
}
