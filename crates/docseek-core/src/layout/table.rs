//! Tables addressable by (row, column).
//!
//! Cells may span several rows or columns; a spanning cell answers for
//! every position it covers.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// A cell in a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Row index (0-based).
    pub row: usize,
    /// Column index (0-based).
    pub col: usize,
    /// Row span (number of rows this cell spans).
    #[serde(default = "one")]
    pub row_span: usize,
    /// Column span (number of columns this cell spans).
    #[serde(default = "one")]
    pub col_span: usize,
    /// Cell text.
    pub content: String,
}

fn one() -> usize {
    1
}

impl TableCell {
    pub fn new(row: usize, col: usize, content: impl Into<String>) -> Self {
        Self {
            row,
            col,
            row_span: 1,
            col_span: 1,
            content: content.into(),
        }
    }

    pub fn with_span(mut self, row_span: usize, col_span: usize) -> Self {
        self.row_span = row_span;
        self.col_span = col_span;
        self
    }

    /// Check if the cell covers a position.
    pub fn covers(&self, row: usize, col: usize) -> bool {
        row >= self.row
            && row < self.row + self.row_span
            && col >= self.col
            && col < self.col + self.col_span
    }
}

/// A table with its page bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Number of rows.
    pub num_rows: usize,
    /// Number of columns.
    pub num_cols: usize,
    /// All cells, in row-major order.
    pub cells: Vec<TableCell>,
    /// Bounding box in page coordinates (x1, y1, x2, y2).
    pub bbox: [f64; 4],
}

impl Table {
    /// Create a table, checking that every cell lies inside the bounds
    /// and no two cells overlap.
    pub fn new(
        num_rows: usize,
        num_cols: usize,
        mut cells: Vec<TableCell>,
        bbox: [f64; 4],
    ) -> Result<Self, LayoutError> {
        let mut covered = vec![vec![false; num_cols]; num_rows];
        for cell in &cells {
            if cell.row_span == 0 || cell.col_span == 0 {
                return Err(LayoutError::InvalidTable(format!(
                    "cell ({}, {}) has an empty span",
                    cell.row, cell.col
                )));
            }
            if cell.row + cell.row_span > num_rows || cell.col + cell.col_span > num_cols {
                return Err(LayoutError::InvalidTable(format!(
                    "cell ({}, {}) exceeds {}x{} bounds",
                    cell.row, cell.col, num_rows, num_cols
                )));
            }
            for row in covered.iter_mut().skip(cell.row).take(cell.row_span) {
                for slot in row.iter_mut().skip(cell.col).take(cell.col_span) {
                    if *slot {
                        return Err(LayoutError::InvalidTable(format!(
                            "cell ({}, {}) overlaps another cell",
                            cell.row, cell.col
                        )));
                    }
                    *slot = true;
                }
            }
        }

        cells.sort_by_key(|c| (c.row, c.col));
        Ok(Self {
            num_rows,
            num_cols,
            cells,
            bbox,
        })
    }

    /// Build a table of single cells from rows of text.
    ///
    /// Short rows are padded with empty cells to the widest row.
    pub fn from_rows<R, S>(rows: R, anchor: (f64, f64)) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let num_rows = rows.len();
        let num_cols = rows.iter().map(Vec::len).max().unwrap_or(0);

        let mut cells = Vec::with_capacity(num_rows * num_cols);
        for (r, row) in rows.into_iter().enumerate() {
            let width = row.len();
            for (c, content) in row.into_iter().enumerate() {
                cells.push(TableCell::new(r, c, content));
            }
            for c in width..num_cols {
                cells.push(TableCell::new(r, c, ""));
            }
        }

        Self {
            num_rows,
            num_cols,
            cells,
            bbox: [anchor.0, anchor.1, anchor.0, anchor.1],
        }
    }

    /// Page position of the table's top-left corner.
    pub fn anchor(&self) -> (f64, f64) {
        (self.bbox[0], self.bbox[1])
    }

    /// Get the cell covering a position.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.cells.iter().find(|c| c.covers(row, col))
    }

    /// Text at a position, if any cell covers it.
    pub fn text_at(&self, row: usize, col: usize) -> Option<&str> {
        self.cell_at(row, col).map(|c| c.content.as_str())
    }

    /// Apply a signed offset to a position, staying inside the table.
    pub fn offset(&self, row: usize, col: usize, dr: i32, dc: i32) -> Option<(usize, usize)> {
        let row = row.checked_add_signed(dr as isize)?;
        let col = col.checked_add_signed(dc as isize)?;
        (row < self.num_rows && col < self.num_cols).then_some((row, col))
    }

    /// Iterate cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.cells.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice_table() -> Table {
        Table::from_rows(
            vec![
                vec!["Item", "Qty", "Amount"],
                vec!["Widget", "2", "10.00"],
                vec!["Total", "", "20.00"],
            ],
            (40.0, 300.0),
        )
    }

    #[test]
    fn test_from_rows() {
        let table = invoice_table();
        assert_eq!((table.num_rows, table.num_cols), (3, 3));
        assert_eq!(table.text_at(1, 2), Some("10.00"));
        assert_eq!(table.anchor(), (40.0, 300.0));
        assert_eq!(table.cells().filter(|c| c.row == 2).count(), 3);
    }

    #[test]
    fn test_from_rows_pads_short_rows() {
        let table = Table::from_rows(vec![vec!["a", "b"], vec!["c"]], (0.0, 0.0));
        assert_eq!(table.text_at(1, 1), Some(""));
        assert_eq!(table.cells().count(), 4);
    }

    #[test]
    fn test_spanning_cell_answers_covered_positions() {
        let cells = vec![
            TableCell::new(0, 0, "Summary").with_span(1, 2),
            TableCell::new(1, 0, "Net"),
            TableCell::new(1, 1, "100"),
        ];
        let table = Table::new(2, 2, cells, [0.0, 0.0, 100.0, 50.0]).unwrap();
        assert_eq!(table.text_at(0, 1), Some("Summary"));
        assert_eq!(table.text_at(1, 1), Some("100"));
    }

    #[test]
    fn test_new_rejects_overlap_and_bounds() {
        let overlap = vec![
            TableCell::new(0, 0, "a").with_span(2, 1),
            TableCell::new(1, 0, "b"),
        ];
        assert!(matches!(
            Table::new(2, 1, overlap, [0.0; 4]),
            Err(LayoutError::InvalidTable(_))
        ));

        let outside = vec![TableCell::new(0, 2, "c")];
        assert!(Table::new(1, 2, outside, [0.0; 4]).is_err());
    }

    #[test]
    fn test_offset_stays_inside() {
        let table = invoice_table();
        assert_eq!(table.offset(0, 0, 2, 2), Some((2, 2)));
        assert_eq!(table.offset(2, 0, 0, -1), None);
        assert_eq!(table.offset(2, 2, 1, 0), None);
    }
}
