//! Resolving cell styles from a page style index.

use serde::{Deserialize, Serialize};

use super::index::{collapse, LineStyles, StyleIndex};
use crate::geometry::PdfBox;
use crate::model::{Cell, CellGrid, SpanStyle, StyleVariant, TableRegion};

/// Markup that table parsers leave in cell text.
const CELL_MARKERS: [&str; 2] = ["<s> \u{83}</s>", "<s>(1)</s>"];

/// Normalize cell text into a line identifier.
///
/// Strips parser markers, joins `" \n "` breaks, keeps only the first line
/// and collapses whitespace.
pub fn normalize_cell_text(text: &str) -> String {
    let mut cleaned = text.to_string();
    for marker in CELL_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    let cleaned = cleaned.replace(" \n ", " ");
    let first_line = cleaned.split('\n').next().unwrap_or("");
    collapse(first_line)
}

/// Span styles recorded for each cell of a grid, row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableStyles {
    cells: Vec<Vec<LineStyles>>,
}

impl TableStyles {
    /// Styles recorded for a cell; `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<&LineStyles> {
        self.cells.get(row)?.get(col)
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    /// Style of the span matching the cell text.
    ///
    /// Span texts and the cell text are compared with leading and trailing
    /// dots and spaces removed. The first matching span wins.
    pub fn span_style(&self, grid: &CellGrid, row: usize, col: usize) -> Option<&SpanStyle> {
        let text = normalize_cell_text(grid.get(row, col)?);
        let wanted = trim_dots(&text);
        self.get(row, col)?
            .iter()
            .find(|(span, _)| trim_dots(span) == wanted)
            .map(|(_, style)| style)
    }
}

fn trim_dots(text: &str) -> &str {
    text.trim_matches(|c| c == '.' || c == ' ')
}

/// Look up every cell of a grid in the style index.
///
/// Empty cells and cells whose text matches no line get an empty entry.
pub fn extract_table_styles(grid: &CellGrid, index: &StyleIndex) -> TableStyles {
    let cells = grid
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|text| {
                    if text.is_empty() {
                        return LineStyles::default();
                    }
                    index
                        .line(&normalize_cell_text(text))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    TableStyles { cells }
}

/// A style attribute that can be read off a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleAttribute {
    /// Font size
    Size,
    /// Style variant
    Variant,
    /// Font family
    Font,
    /// Fill colour
    Color,
    /// Span bounding box
    BBox,
}

/// Value of a [`StyleAttribute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleValue {
    /// Font size in points
    Size(f64),
    /// Style variant
    Variant(StyleVariant),
    /// Font family
    Font(String),
    /// Fill colour as 0xRRGGBB
    Color(u32),
    /// Bounding box on the page
    BBox(PdfBox),
}

impl StyleValue {
    /// Value used when no span matched.
    pub fn default_for(attribute: StyleAttribute) -> Self {
        match attribute {
            StyleAttribute::Size => StyleValue::Size(0.0),
            StyleAttribute::Variant => StyleValue::Variant(StyleVariant::default()),
            StyleAttribute::Font => StyleValue::Font(String::new()),
            StyleAttribute::Color => StyleValue::Color(0),
            StyleAttribute::BBox => StyleValue::BBox(PdfBox::zero()),
        }
    }

    /// Read an attribute from a span style.
    pub fn from_style(style: &SpanStyle, attribute: StyleAttribute) -> Self {
        match attribute {
            StyleAttribute::Size => StyleValue::Size(style.size),
            StyleAttribute::Variant => StyleValue::Variant(style.variant),
            StyleAttribute::Font => StyleValue::Font(style.font.clone()),
            StyleAttribute::Color => StyleValue::Color(style.color),
            StyleAttribute::BBox => StyleValue::BBox(style.bbox),
        }
    }

    /// Font size, or `None` for other attributes.
    pub fn as_size(&self) -> Option<f64> {
        match self {
            StyleValue::Size(size) => Some(*size),
            _ => None,
        }
    }
}

/// Read one style attribute of a cell.
///
/// Never fails: a cell outside the grid or without a matching span yields
/// the attribute's default, e.g. a size of 0.
pub fn resolve_cell_style(
    styles: &TableStyles,
    grid: &CellGrid,
    row: usize,
    col: usize,
    attribute: StyleAttribute,
) -> StyleValue {
    match styles.span_style(grid, row, col) {
        Some(style) => StyleValue::from_style(style, attribute),
        None => StyleValue::default_for(attribute),
    }
}

/// Pair every cell of a grid with its resolved style.
pub fn attach_styles(region: &TableRegion, grid: &CellGrid, index: &StyleIndex) -> Vec<Vec<Cell>> {
    let styles = extract_table_styles(grid, index);
    let cells: Vec<Vec<Cell>> = grid
        .rows()
        .iter()
        .enumerate()
        .map(|(row, texts)| {
            texts
                .iter()
                .enumerate()
                .map(|(col, text)| Cell {
                    row,
                    col,
                    text: text.clone(),
                    page: region.page,
                    style: styles.span_style(grid, row, col).cloned(),
                })
                .collect()
        })
        .collect();

    let styled = cells.iter().flatten().filter(|c| c.style.is_some()).count();
    log::debug!(
        "Page {}: styled {} of {} cells",
        region.page,
        styled,
        grid.row_count() * grid.column_count()
    );
    cells
}
