//! Locating options and page selection.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};
use crate::geometry::DEFAULT_MARGIN;

/// Default rasterization resolution.
pub const DEFAULT_DPI: u32 = 300;

/// Options for locating tables in a document.
#[derive(Debug, Clone)]
pub struct LocateOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Rasterization resolution in dots per inch
    pub dpi: u32,

    /// Horizontal padding ratio applied to detections
    pub x_margin: f64,

    /// Vertical padding ratio applied to detections
    pub y_margin: f64,

    /// Drop detections below this confidence
    pub min_confidence: Option<f32>,

    /// Whether to process pages in parallel
    pub parallel: bool,

    /// Page selection (which pages to process)
    pub pages: PageSelection,

    /// Password for encrypted documents
    pub password: Option<String>,

    /// Write each page raster as `page-<n>.png` into the workspace
    pub save_images: bool,

    /// Keep per-page artifacts after processing
    pub keep_artifacts: bool,
}

impl LocateOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip failing pages).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set rasterization resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    /// Set both padding ratios.
    pub fn with_margins(mut self, x_margin: f64, y_margin: f64) -> Self {
        self.x_margin = x_margin;
        self.y_margin = y_margin;
        self
    }

    /// Set the minimum detection confidence.
    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.min_confidence = Some(confidence);
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set password for encrypted documents.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Save page rasters into the workspace.
    pub fn with_saved_images(mut self, save: bool) -> Self {
        self.save_images = save;
        self
    }

    /// Keep per-page artifacts in the workspace.
    pub fn with_kept_artifacts(mut self, keep: bool) -> Self {
        self.keep_artifacts = keep;
        self
    }
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            dpi: DEFAULT_DPI,
            x_margin: DEFAULT_MARGIN,
            y_margin: DEFAULT_MARGIN,
            min_confidence: None,
            parallel: true,
            pages: PageSelection::All,
            password: None,
            save_images: false,
            keep_artifacts: false,
        }
    }
}

/// Error handling mode while processing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    #[default]
    Strict,
    /// Log and skip pages that fail
    Lenient,
}

/// Page selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// Page range (1-indexed, inclusive)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
    /// Mixed list of pages and ranges, e.g. `1,4-end`
    Spans(Vec<PageSpan>),
}

/// One element of a mixed page list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    /// First page (1-indexed)
    pub start: u32,
    /// Last page, or `None` for the last page of the document
    pub end: Option<u32>,
}

impl PageSelection {
    /// Check if a page number is included in the selection.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
            PageSelection::Spans(spans) => spans
                .iter()
                .any(|s| page >= s.start && s.end.map_or(true, |end| page <= end)),
        }
    }

    /// Parse a selection such as `"1"`, `"1,3,4"`, `"2-5"`, `"1,4-end"` or `"all"`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let mut spans = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            let span = match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_page_number(start)?;
                    let end = match end.trim() {
                        e if e.eq_ignore_ascii_case("end") => None,
                        e => Some(parse_page_number(e)?),
                    };
                    if end.is_some_and(|end| end < start) {
                        return Err(Error::InvalidPageRange(part.to_string()));
                    }
                    PageSpan { start, end }
                }
                None => {
                    let page = parse_page_number(part)?;
                    PageSpan {
                        start: page,
                        end: Some(page),
                    }
                }
            };
            spans.push(span);
        }

        let all_single = spans.iter().all(|s| s.end == Some(s.start));
        Ok(match spans.as_slice() {
            [PageSpan {
                start,
                end: Some(end),
            }] if start != end => PageSelection::Range(*start..=*end),
            _ if all_single => PageSelection::Pages(spans.iter().map(|s| s.start).collect()),
            _ => PageSelection::Spans(spans),
        })
    }

    /// Expand the selection against a document of `page_count` pages.
    ///
    /// Returns sorted, de-duplicated page numbers. Explicit pages beyond the
    /// document fail with [`Error::PageOutOfRange`]; an open-ended span such
    /// as `4-end` on a 3-page document is empty.
    pub fn resolve(&self, page_count: u32) -> Result<Vec<u32>> {
        let check = |page: u32| {
            if page == 0 || page > page_count {
                Err(Error::PageOutOfRange(page, page_count))
            } else {
                Ok(page)
            }
        };

        let mut pages = match self {
            PageSelection::All => (1..=page_count).collect(),
            PageSelection::Range(range) => {
                check(*range.start())?;
                check(*range.end())?;
                range.clone().collect()
            }
            PageSelection::Pages(pages) => pages
                .iter()
                .map(|&p| check(p))
                .collect::<Result<Vec<_>>>()?,
            PageSelection::Spans(spans) => {
                let mut pages = Vec::new();
                for span in spans {
                    match span.end {
                        Some(end) => pages.extend(check(span.start)?..=check(end)?),
                        // Open-ended spans past the last page select nothing
                        None => pages.extend(span.start..=page_count),
                    }
                }
                pages
            }
        };
        pages.sort_unstable();
        pages.dedup();
        Ok(pages)
    }
}

fn parse_page_number(s: &str) -> Result<u32> {
    match s.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(Error::InvalidPageRange(s.trim().to_string())),
        Ok(page) => Ok(page),
    }
}
