//! Cell grids returned by table parsers.

use super::SpanStyle;
use serde::{Deserialize, Serialize};

/// Rectangular grid of cell texts, row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellGrid {
    rows: Vec<Vec<String>>,
}

impl CellGrid {
    /// Create a grid, padding short rows with empty cells.
    pub fn new(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows }
    }

    /// Build a grid from string slices.
    pub fn from_strs(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Check if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.column_count() == 0
    }

    /// Cell text, if the position exists.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Rows of the grid.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Iterate over `(row, col, text)`.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &str)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, text)| (r, c, text.as_str()))
        })
    }
}

/// A table cell with its resolved style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Row index (0-based)
    pub row: usize,
    /// Column index (0-based)
    pub col: usize,
    /// Cell text as returned by the parser
    pub text: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Style of the matching span; `None` when nothing matched
    pub style: Option<SpanStyle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_pads_rows() {
        let grid = CellGrid::from_strs(&[&["a", "b", "c"], &["d"]]);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.get(1, 2), Some(""));
        assert_eq!(grid.get(2, 0), None);
    }

    #[test]
    fn test_cells_iterates_row_major() {
        let grid = CellGrid::from_strs(&[&["a", "b"], &["c", "d"]]);
        let texts: Vec<_> = grid.cells().map(|(_, _, t)| t).collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
        assert!(!grid.is_empty());
        assert!(CellGrid::default().is_empty());
    }
}
