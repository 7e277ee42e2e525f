//! Declarative field configuration: what to look for and how to walk to it.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name reserved for the synthetic root of the search tree.
pub const ROOT_NAME: &str = "<root>";

/// Scalar type of an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Number,
    Date,
}

impl ScalarType {
    fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Number => "Number",
            ScalarType::Date => "Date",
        }
    }
}

impl FromStr for ScalarType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Ok(ScalarType::String),
            "number" => Ok(ScalarType::Number),
            "date" => Ok(ScalarType::Date),
            _ => Err(ConfigError::InvalidValueType(s.to_string())),
        }
    }
}

/// Declared value type of a field, e.g. `Number`, `Table` or `Table/Date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValueType {
    /// Scalar type of the value.
    pub scalar: ScalarType,
    /// Whether the value is looked up in tables instead of lines.
    pub table: bool,
}

impl ValueType {
    pub const STRING: ValueType = ValueType::scalar(ScalarType::String);
    pub const NUMBER: ValueType = ValueType::scalar(ScalarType::Number);
    pub const DATE: ValueType = ValueType::scalar(ScalarType::Date);

    /// A line-based value type.
    pub const fn scalar(scalar: ScalarType) -> Self {
        Self {
            scalar,
            table: false,
        }
    }

    /// A table-based value type.
    pub const fn table(scalar: ScalarType) -> Self {
        Self {
            scalar,
            table: true,
        }
    }

    /// Check if the field is resolved through tables.
    pub fn is_table(&self) -> bool {
        self.table
    }
}

impl Default for ValueType {
    fn default() -> Self {
        Self::STRING
    }
}

impl FromStr for ValueType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower == "table" {
            return Ok(ValueType::table(ScalarType::String));
        }
        if let Some(rest) = lower.strip_prefix("table/") {
            return rest
                .parse()
                .map(ValueType::table)
                .map_err(|_| ConfigError::InvalidValueType(s.to_string()));
        }

        trimmed.parse().map(ValueType::scalar)
    }
}

impl TryFrom<String> for ValueType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table {
            write!(f, "Table/{}", self.scalar.as_str())
        } else {
            f.write_str(self.scalar.as_str())
        }
    }
}

/// Which part of a line is searched relative to the current anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalStatus {
    /// Only units at or left of the anchor (-1).
    Left,
    /// The whole line (0).
    #[default]
    Whole,
    /// Only units at or right of the anchor (1).
    Right,
}

impl HorizontalStatus {
    /// Numeric code used in configuration files.
    pub fn code(&self) -> i32 {
        match self {
            HorizontalStatus::Left => -1,
            HorizontalStatus::Whole => 0,
            HorizontalStatus::Right => 1,
        }
    }
}

impl TryFrom<i32> for HorizontalStatus {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(HorizontalStatus::Left),
            0 => Ok(HorizontalStatus::Whole),
            1 => Ok(HorizontalStatus::Right),
            other => Err(other),
        }
    }
}

/// Expression parameters, interpreted per value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchParams {
    /// Line fields: raw line offset from the parent match and the horizontal scope.
    Positional {
        line_offset: i32,
        status: HorizontalStatus,
    },
    /// Table fields: cell offset from the parent match.
    Table { row_offset: i32, col_offset: i32 },
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams::Positional {
            line_offset: 0,
            status: HorizontalStatus::Whole,
        }
    }
}

/// One step of a field's search chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    /// Regular expression matched against text units or cells.
    pub pattern: String,
    /// Line offset (line fields) or row offset (table fields).
    #[serde(default)]
    pub first: i32,
    /// Horizontal status (line fields) or column offset (table fields).
    #[serde(default)]
    pub second: i32,
}

impl Expression {
    pub fn new(pattern: impl Into<String>, first: i32, second: i32) -> Self {
        Self {
            pattern: pattern.into(),
            first,
            second,
        }
    }

    /// Split the raw parameters according to the owning field's value type.
    ///
    /// Out-of-range horizontal statuses are rejected by [`FieldConfig::validate`];
    /// here they fall back to the whole line.
    pub fn params(&self, value_type: ValueType) -> SearchParams {
        if value_type.is_table() {
            SearchParams::Table {
                row_offset: self.first,
                col_offset: self.second,
            }
        } else {
            SearchParams::Positional {
                line_offset: self.first,
                status: HorizontalStatus::try_from(self.second).unwrap_or_default(),
            }
        }
    }
}

fn no_grid() -> (i32, i32) {
    (-1, -1)
}

/// Configuration of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Output name of the field.
    pub name: String,

    /// Declared value type.
    #[serde(default)]
    pub value_type: ValueType,

    /// Expected text of the anchor match; empty disables similarity checks.
    #[serde(default)]
    pub check: String,

    /// Grid segment (row, col) restricting the search, or (-1, -1).
    #[serde(default = "no_grid")]
    pub grid: (i32, i32),

    /// Compare phonetic codes instead of raw text.
    #[serde(default)]
    pub phonetic: bool,

    /// Ordered search chain.
    pub expressions: Vec<Expression>,
}

impl FieldSpec {
    /// Create a field without grid restriction or check value.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            check: String::new(),
            grid: no_grid(),
            phonetic: false,
            expressions: Vec::new(),
        }
    }

    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.check = check.into();
        self
    }

    pub fn with_grid(mut self, row: i32, col: i32) -> Self {
        self.grid = (row, col);
        self
    }

    pub fn with_phonetic(mut self, phonetic: bool) -> Self {
        self.phonetic = phonetic;
        self
    }

    pub fn with_expression(mut self, expression: Expression) -> Self {
        self.expressions.push(expression);
        self
    }

    /// Check value, if any.
    pub fn check_value(&self) -> Option<&str> {
        let check = self.check.trim();
        (!check.is_empty()).then_some(check)
    }

    /// Grid segment restriction, if any.
    pub fn grid_cell(&self) -> Option<(usize, usize)> {
        let (row, col) = self.grid;
        if row < 0 || col < 0 {
            return None;
        }
        Some((row as usize, col as usize))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name == ROOT_NAME {
            return Err(ConfigError::ReservedName(self.name.clone()));
        }
        if self.expressions.is_empty() {
            return Err(ConfigError::NoExpressions(self.name.clone()));
        }
        if !self.value_type.is_table() {
            for (index, expression) in self.expressions.iter().enumerate() {
                HorizontalStatus::try_from(expression.second).map_err(|value| {
                    ConfigError::HorizontalStatusOutOfRange {
                        field: self.name.clone(),
                        index,
                        value,
                    }
                })?;
            }
        }
        Ok(())
    }
}

/// Ordered collection of field specifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub fields: Vec<FieldSpec>,
}

impl FieldConfig {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check load-time invariants of every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            field.validate()?;
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::DuplicateField(field.name.clone()));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: FieldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn total_field() -> FieldSpec {
        FieldSpec::new("Total", ValueType::NUMBER)
            .with_check("Total")
            .with_expression(Expression::new(r"Total:\s*(\d+)", 0, 0))
    }

    #[test]
    fn test_parse_value_types() {
        assert_eq!("Number".parse::<ValueType>().unwrap(), ValueType::NUMBER);
        assert_eq!("date".parse::<ValueType>().unwrap(), ValueType::DATE);
        assert_eq!(
            "Table".parse::<ValueType>().unwrap(),
            ValueType::table(ScalarType::String)
        );
        assert_eq!(
            "Table/Number".parse::<ValueType>().unwrap(),
            ValueType::table(ScalarType::Number)
        );
        assert!("Table/Currency".parse::<ValueType>().is_err());
        assert!("Money".parse::<ValueType>().is_err());
    }

    #[test]
    fn test_value_type_display_round_trip() {
        for tag in ["String", "Number", "Date", "Table/String", "Table/Date"] {
            let parsed: ValueType = tag.parse().unwrap();
            assert_eq!(parsed.to_string(), tag);
        }
    }

    #[test]
    fn test_expression_params_split_by_type() {
        let expression = Expression::new("x", 2, -1);
        assert_eq!(
            expression.params(ValueType::NUMBER),
            SearchParams::Positional {
                line_offset: 2,
                status: HorizontalStatus::Left
            }
        );
        assert_eq!(
            expression.params(ValueType::table(ScalarType::Number)),
            SearchParams::Table {
                row_offset: 2,
                col_offset: -1
            }
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_status() {
        let field = FieldSpec::new("Total", ValueType::NUMBER)
            .with_expression(Expression::new("Total", 0, 0))
            .with_expression(Expression::new(r"\d+", 0, 2));
        let err = FieldConfig::new(vec![field]).validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::HorizontalStatusOutOfRange { index: 1, value: 2, .. }
        ));
    }

    #[test]
    fn test_validate_allows_any_table_offsets() {
        let field = FieldSpec::new("Amount", ValueType::table(ScalarType::Number))
            .with_expression(Expression::new("Amount", 3, 5));
        assert!(FieldConfig::new(vec![field]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_reserved_and_duplicate_names() {
        let mut reserved = total_field();
        reserved.name = ROOT_NAME.to_string();
        assert!(matches!(
            FieldConfig::new(vec![reserved]).validate(),
            Err(ConfigError::ReservedName(_))
        ));

        assert!(matches!(
            FieldConfig::new(vec![total_field(), total_field()]).validate(),
            Err(ConfigError::DuplicateField(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_chain() {
        let field = FieldSpec::new("Empty", ValueType::STRING);
        assert!(matches!(
            FieldConfig::new(vec![field]).validate(),
            Err(ConfigError::NoExpressions(_))
        ));
    }

    #[test]
    fn test_from_json_defaults() {
        let json = r#"{
            "fields": [
                {
                    "name": "Invoice date",
                    "value_type": "Date",
                    "expressions": [
                        { "pattern": "Date" },
                        { "pattern": "(\\d{2}\\.\\d{2}\\.\\d{4})", "first": 0, "second": 1 }
                    ]
                }
            ]
        }"#;
        let config = FieldConfig::from_json(json).unwrap();
        let field = &config.fields[0];
        assert_eq!(field.value_type, ValueType::DATE);
        assert_eq!(field.grid_cell(), None);
        assert_eq!(field.check_value(), None);
        assert!(!field.phonetic);
        assert_eq!(field.expressions[1], Expression::new(r"(\d{2}\.\d{2}\.\d{4})", 0, 1));
    }

    #[test]
    fn test_from_json_rejects_bad_status() {
        let json = r#"{"fields":[{"name":"A","expressions":[{"pattern":"a","second":-3}]}]}"#;
        assert!(matches!(
            FieldConfig::from_json(json),
            Err(ConfigError::HorizontalStatusOutOfRange { value: -3, .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.json");
        let config = FieldConfig::new(vec![total_field().with_grid(2, 1).with_phonetic(true)]);

        config.save(&path).unwrap();
        let loaded = FieldConfig::from_file(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.fields[0].grid_cell(), Some((2, 1)));
    }
}
