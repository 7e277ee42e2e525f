//! Document layout: positioned text, tables and the grid over them.

pub mod grid;
pub mod table;
pub mod text;

pub use grid::{GridPartition, GridSegment};
pub use table::{Table, TableCell};
pub use text::{Bounds, TextModel, TextUnit, UNKNOWN_LINE, units_in_scope};

use crate::error::LayoutError;
use crate::models::GridConfig;
use crate::phonetic::PhoneticEncoder;

/// A document ready for field extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    text: TextModel,
    tables: Vec<Table>,
    grid: GridPartition,
    grid_config: GridConfig,
}

impl Document {
    /// Bundle text and tables and precompute the grid partition.
    pub fn new(
        text: TextModel,
        tables: Vec<Table>,
        grid_config: &GridConfig,
    ) -> Result<Self, LayoutError> {
        let grid = GridPartition::build(&text, &tables, grid_config)?;
        Ok(Self {
            text,
            tables,
            grid,
            grid_config: grid_config.clone(),
        })
    }

    /// Document from plain text with the default 3×3 grid.
    pub fn from_text(text: &str) -> Result<Self, LayoutError> {
        Self::new(TextModel::from_text(text), Vec::new(), &GridConfig::default())
    }

    pub fn text(&self) -> &TextModel {
        &self.text
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn grid(&self) -> &GridPartition {
        &self.grid
    }

    /// Pre-encode every text unit and rebuild the grid from the encoded text.
    pub fn with_phonetic(mut self, encoder: &dyn PhoneticEncoder) -> Result<Self, LayoutError> {
        self.text.encode_phonetic(encoder);
        self.grid = GridPartition::build(&self.text, &self.tables, &self.grid_config)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phonetic::Soundex;

    #[test]
    fn test_with_phonetic_reaches_segments() {
        let doc = Document::from_text("Robert").unwrap().with_phonetic(&Soundex).unwrap();
        assert_eq!(doc.text().line(1).unwrap()[0].phonetic, vec!["R163".to_string()]);

        let segment = doc.grid().segment(0, 0).unwrap();
        assert_eq!(segment.text.line(1).unwrap()[0].phonetic, vec!["R163".to_string()]);
    }
}
