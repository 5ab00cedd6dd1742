//! Text-alignment cell extraction (stream flavour).
//!
//! Builds a cell grid from the text runs inside a table region without
//! relying on ruling lines: runs are grouped into rows by baseline, column
//! edges are found where left edges line up across rows, and each run is
//! assigned to the column it starts in.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::model::{CellGrid, Page, TableRegion, TextRun};

/// A table-structure parser.
///
/// Given a page and a region on it, returns the grid of cell texts.
pub trait CellExtractor: Send + Sync {
    /// Extract the cell grid of `region` on `page`.
    fn extract_cells(&self, page: &Page, region: &TableRegion) -> Result<CellGrid>;
}

/// Stream extractor configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Y tolerance for grouping runs into rows (fraction of font size)
    pub y_tolerance_factor: f64,
    /// Minimum fraction of multi-run rows a column edge must appear in
    pub min_alignment_ratio: f64,
    /// Minimum gap between columns (points)
    pub min_column_gap: f64,
    /// Width of the buckets left edges are snapped to (points)
    pub bucket_size: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
            bucket_size: 5.0,
        }
    }
}

/// A row of runs sharing a baseline.
#[derive(Debug, Clone)]
struct RowData<'a> {
    runs: Vec<&'a TextRun>,
}

/// Default [`CellExtractor`] working from text positions alone.
#[derive(Debug, Clone, Default)]
pub struct StreamCellExtractor {
    config: StreamConfig,
}

impl StreamCellExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with custom configuration.
    pub fn with_config(config: StreamConfig) -> Self {
        Self { config }
    }

    /// Build a grid from runs already known to belong to one table.
    pub fn grid_from_runs(&self, runs: &[&TextRun]) -> CellGrid {
        if runs.is_empty() {
            return CellGrid::default();
        }

        let rows = self.group_into_rows(runs);
        let mut columns = self.detect_columns(&rows);
        if columns.is_empty() {
            columns.push(runs.iter().map(|r| r.bbox.min_x()).fold(f64::INFINITY, f64::min));
        }
        let right_x = runs
            .iter()
            .map(|r| r.bbox.max_x())
            .fold(f64::NEG_INFINITY, f64::max);
        log::debug!(
            "Stream grid: {} rows, {} columns at {:?}",
            rows.len(),
            columns.len(),
            columns
        );

        let grid = rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
                for run in &row.runs {
                    let col = find_column(run.bbox.min_x(), &columns, right_x);
                    let text = run.text.trim();
                    if !text.is_empty() {
                        cells[col].push(text);
                    }
                }
                cells.into_iter().map(|parts| parts.join(" ")).collect()
            })
            .collect();

        CellGrid::new(grid)
    }

    /// Group runs into rows, top to bottom.
    fn group_into_rows<'a>(&self, runs: &[&'a TextRun]) -> Vec<RowData<'a>> {
        let mut sorted = runs.to_vec();
        sorted.sort_by(|a, b| {
            b.bbox
                .min_y()
                .total_cmp(&a.bbox.min_y())
                .then(a.bbox.min_x().total_cmp(&b.bbox.min_x()))
        });

        let mut rows: Vec<RowData<'a>> = Vec::new();
        let mut current: Vec<&'a TextRun> = Vec::new();
        let mut current_y: Option<f64> = None;

        for run in sorted {
            let tolerance = run.size * self.config.y_tolerance_factor;
            match current_y {
                Some(y) if (run.bbox.min_y() - y).abs() <= tolerance => current.push(run),
                _ => {
                    if !current.is_empty() {
                        rows.push(RowData {
                            runs: std::mem::take(&mut current),
                        });
                    }
                    current_y = Some(run.bbox.min_y());
                    current.push(run);
                }
            }
        }
        if !current.is_empty() {
            rows.push(RowData { runs: current });
        }

        rows
    }

    /// Column left edges that line up across rows.
    ///
    /// Rows with two or more runs vote once per bucket; when fewer than two
    /// such rows exist every run votes.
    fn detect_columns(&self, rows: &[RowData<'_>]) -> Vec<f64> {
        let multi: Vec<&RowData<'_>> = rows.iter().filter(|r| r.runs.len() >= 2).collect();
        let bucket_size = self.config.bucket_size;
        let mut edge_counts: HashMap<i64, usize> = HashMap::new();

        let voters = if multi.len() >= 2 {
            for row in &multi {
                let buckets: HashSet<i64> = row
                    .runs
                    .iter()
                    .map(|r| (r.bbox.min_x() / bucket_size).round() as i64)
                    .collect();
                for bucket in buckets {
                    *edge_counts.entry(bucket).or_insert(0) += 1;
                }
            }
            multi.len()
        } else {
            for row in rows {
                for run in &row.runs {
                    let bucket = (run.bbox.min_x() / bucket_size).round() as i64;
                    *edge_counts.entry(bucket).or_insert(0) += 1;
                }
            }
            rows.len()
        };

        let min_occurrences =
            ((voters as f64 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f64> = edge_counts
            .iter()
            .filter(|(_, count)| **count >= min_occurrences)
            .map(|(bucket, _)| *bucket as f64 * bucket_size)
            .collect();
        edges.sort_by(f64::total_cmp);

        let mut merged: Vec<f64> = Vec::new();
        for edge in edges {
            match merged.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }
}

impl CellExtractor for StreamCellExtractor {
    fn extract_cells(&self, page: &Page, region: &TableRegion) -> Result<CellGrid> {
        let runs: Vec<&TextRun> = page
            .runs()
            .filter(|r| !r.text.trim().is_empty())
            .filter(|r| {
                let (cx, cy) = r.bbox.center();
                region.bbox.contains(cx, cy)
            })
            .collect();
        log::debug!(
            "Page {}: {} runs inside region {}",
            page.number,
            runs.len(),
            region.area()
        );
        Ok(self.grid_from_runs(&runs))
    }
}

/// Column a run starting at `x` belongs to.
///
/// Runs starting up to 10pt before a column edge still count for it; runs
/// outside every column go to the nearest edge.
fn find_column(x: f64, columns: &[f64], right_x: f64) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if x >= start - 10.0 && x < end - 10.0 {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (x - **a).abs().total_cmp(&(x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
