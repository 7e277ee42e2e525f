//! Spatial partition of a document into an R×C grid of segments.

use tracing::debug;

use super::table::Table;
use super::text::{Bounds, TextModel};
use crate::error::LayoutError;
use crate::models::GridConfig;

/// One cell of the grid: the text and tables falling inside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridSegment {
    pub row: usize,
    pub col: usize,
    pub text: TextModel,
    pub tables: Vec<Table>,
}

/// Document content divided into equal-sized bands by coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPartition {
    rows: usize,
    cols: usize,
    segments: Vec<GridSegment>,
}

#[derive(Debug, Clone, Copy)]
struct Band {
    min: f64,
    max: f64,
    count: usize,
}

impl Band {
    fn index(&self, value: f64) -> usize {
        let span = self.max - self.min;
        if span <= 0.0 || !value.is_finite() {
            return 0;
        }
        let position = ((value - self.min) / span * self.count as f64).floor();
        (position.max(0.0) as usize).min(self.count - 1)
    }
}

impl GridPartition {
    /// Partition text and tables.
    ///
    /// Every line is assigned to the row band of its topmost unit; its
    /// units are then spread over column bands by x. Each table goes to the
    /// segment holding its anchor.
    pub fn build(
        text: &TextModel,
        tables: &[Table],
        config: &GridConfig,
    ) -> Result<Self, LayoutError> {
        let rows = config.rows.max(1);
        let cols = config.cols.max(1);

        let mut segments: Vec<GridSegment> = (0..rows * cols)
            .map(|i| GridSegment {
                row: i / cols,
                col: i % cols,
                ..GridSegment::default()
            })
            .collect();

        let Some(bounds) = content_bounds(text, tables) else {
            return Ok(Self {
                rows,
                cols,
                segments,
            });
        };
        let row_band = Band {
            min: bounds.min_y,
            max: bounds.max_y,
            count: rows,
        };
        let col_band = Band {
            min: bounds.min_x,
            max: bounds.max_x,
            count: cols,
        };

        for (line, units) in text.lines() {
            let Some(top) = text.top(line) else {
                continue;
            };
            let row = row_band.index(top);
            for unit in units {
                let col = col_band.index(unit.x);
                segments[row * cols + col].text.push(line, unit.clone())?;
            }
        }

        for table in tables {
            let (x, y) = table.anchor();
            let index = row_band.index(y) * cols + col_band.index(x);
            segments[index].tables.push(table.clone());
        }

        debug!(
            "Built {}x{} grid over {} lines and {} tables",
            rows,
            cols,
            text.line_count(),
            tables.len()
        );

        Ok(Self {
            rows,
            cols,
            segments,
        })
    }

    /// Get the segment at (row, col).
    pub fn segment(&self, row: usize, col: usize) -> Option<&GridSegment> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.segments.get(row * self.cols + col)
    }

    /// All segments in row-major order.
    pub fn segments(&self) -> &[GridSegment] {
        &self.segments
    }

    /// Grid size as (rows, cols).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

fn content_bounds(text: &TextModel, tables: &[Table]) -> Option<Bounds> {
    let mut bounds = text.bounds();
    for table in tables {
        let (x, y) = table.anchor();
        match bounds.as_mut() {
            Some(b) => b.include(x, y),
            None => bounds = Some(Bounds::point(x, y)),
        }
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::text::TextUnit;

    fn page() -> TextModel {
        let mut text = TextModel::new();
        for line in 1..=30u32 {
            let y = line as f64 * 10.0;
            text.push(line, TextUnit::new(format!("left {line}"), 0.0, y)).unwrap();
            text.push(line, TextUnit::new(format!("mid {line}"), 150.0, y)).unwrap();
            text.push(line, TextUnit::new(format!("right {line}"), 300.0, y)).unwrap();
        }
        text
    }

    #[test]
    fn test_every_line_lands_in_exactly_one_row_band() {
        let text = page();
        let grid = GridPartition::build(&text, &[], &GridConfig::default()).unwrap();

        for (line, units) in text.lines() {
            let bands: Vec<usize> = (0..3)
                .filter(|&row| {
                    (0..3).any(|col| grid.segment(row, col).unwrap().text.contains(line))
                })
                .collect();
            assert_eq!(bands.len(), 1, "line {line} in bands {bands:?}");

            let placed: usize = (0..3)
                .map(|col| {
                    grid.segment(bands[0], col)
                        .unwrap()
                        .text
                        .line(line)
                        .map_or(0, |u| u.len())
                })
                .sum();
            assert_eq!(placed, units.len());
        }
    }

    #[test]
    fn test_units_split_by_column() {
        let grid = GridPartition::build(&page(), &[], &GridConfig::default()).unwrap();
        let top_left = grid.segment(0, 0).unwrap();
        let top_right = grid.segment(0, 2).unwrap();

        assert_eq!(top_left.text.line(1).unwrap()[0].text, "left 1");
        assert_eq!(top_right.text.line(1).unwrap()[0].text, "right 1");
        assert_eq!(grid.segment(2, 1).unwrap().text.line(30).unwrap()[0].text, "mid 30");
    }

    #[test]
    fn test_table_goes_to_anchor_segment() {
        let tables = vec![
            Table::from_rows(vec![vec!["a"]], (10.0, 20.0)),
            Table::from_rows(vec![vec!["b"]], (290.0, 280.0)),
        ];
        let grid = GridPartition::build(&page(), &tables, &GridConfig::default()).unwrap();

        let total: usize = grid.segments().iter().map(|s| s.tables.len()).sum();
        assert_eq!(total, 2);
        assert_eq!(grid.segment(0, 0).unwrap().tables[0].text_at(0, 0), Some("a"));
        assert_eq!(grid.segment(2, 2).unwrap().tables[0].text_at(0, 0), Some("b"));
    }

    #[test]
    fn test_empty_document_has_empty_segments() {
        let config = GridConfig { rows: 2, cols: 4 };
        let grid = GridPartition::build(&TextModel::new(), &[], &config).unwrap();
        assert_eq!(grid.dimensions(), (2, 4));
        assert_eq!(grid.segments().len(), 8);
        assert!(grid.segment(2, 0).is_none());
        assert!(grid.segments().iter().all(|s| s.text.is_empty()));
    }

    #[test]
    fn test_single_point_document() {
        let text = TextModel::from_text("only");
        let grid = GridPartition::build(&text, &[], &GridConfig::default()).unwrap();
        assert!(grid.segment(0, 0).unwrap().text.contains(1));
    }
}
