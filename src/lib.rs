//! # untable
//!
//! Table region location and cell style reconciliation for PDF documents.
//!
//! A page is cut out of its document, turned upright, rendered and handed
//! to a table-region detector. The detector's pixel boxes are mapped back
//! onto the page in PDF units, ready for a table-structure parser, and the
//! parser's cells are matched with the fonts they were drawn in.
//!
//! ## Quick Start
//!
//! ```no_run
//! use untable::{locate_tables, LocateOptions, PageRenderer, RasterImage, RawDetection,
//!     RegionDetector};
//!
//! struct MyRenderer;
//! impl PageRenderer for MyRenderer {
//!     fn render(&self, pdf: &[u8], dpi: u32) -> untable::Result<image::DynamicImage> {
//!         unimplemented!()
//!     }
//! }
//!
//! struct MyDetector;
//! impl RegionDetector for MyDetector {
//!     fn detect(&self, image: &RasterImage) -> untable::Result<Vec<RawDetection>> {
//!         unimplemented!()
//!     }
//! }
//!
//! fn main() -> untable::Result<()> {
//!     let options = LocateOptions::new().with_dpi(200);
//!     let regions = locate_tables("report.pdf", MyRenderer, MyDetector, options)?;
//!     for region in regions {
//!         println!("page {}: {}", region.page, region.area());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Page isolation**: every page becomes a standalone one-page PDF
//! - **Rotation correction**: quarter-turned pages are detected from their text
//! - **Typed geometry**: image, normalized and PDF boxes cannot be mixed
//! - **Style recovery**: cells resolve to the size, font and colour they were drawn in
//! - **Parallel processing**: uses Rayon for multi-page documents
//! - **pdfium rendering**: optional, behind the `pdfium` feature

pub mod detect;
pub mod error;
pub mod geometry;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod raster;
pub mod region;
pub mod report;
pub mod style;

// Re-export commonly used types
pub use detect::{is_pdf_bytes, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, Result};
pub use geometry::{BBox, ImageBox, NormalizedBox, PageFrame, PdfBox};
pub use model::{
    Cell, CellGrid, Page, RawDetection, Rotation, SpanStyle, StyleVariant, TableRegion, TextLine,
    TextRun,
};
pub use parser::{
    correct_rotation, detect_rotation, CellExtractor, Document, ErrorMode, LocateOptions,
    PageSelection, SinglePageDocument, StreamCellExtractor,
};
pub use pipeline::{LocatedPage, LocatedTable, TableLocator, Workspace};
pub use raster::{rasterize, PageRenderer, RasterImage};
pub use region::{parse_detections, reconcile, RegionDetector};
pub use report::{to_json, JsonFormat};
pub use style::{
    attach_styles, build_style_index, extract_table_styles, resolve_cell_style, StyleAttribute,
    StyleIndex, StyleValue, TableStyles,
};

#[cfg(feature = "pdfium")]
pub use raster::PdfiumRenderer;

use std::path::Path;

/// Open a PDF file, using the password from `options` when set.
pub fn open_document<P: AsRef<Path>>(path: P, options: &LocateOptions) -> Result<Document> {
    Document::open(path, options.password.as_deref())
}

/// Locate the tables of a PDF file in a temporary workspace.
///
/// # Example
///
/// ```no_run
/// # use untable::{locate_tables, LocateOptions, PageRenderer, RegionDetector};
/// # fn run(renderer: impl PageRenderer + 'static, detector: impl RegionDetector + 'static) {
/// let options = LocateOptions::new().with_pages(untable::PageSelection::parse("1,4-end").unwrap());
/// let regions = locate_tables("document.pdf", renderer, detector, options).unwrap();
/// # }
/// ```
pub fn locate_tables<P, R, D>(
    path: P,
    renderer: R,
    detector: D,
    options: LocateOptions,
) -> Result<Vec<TableRegion>>
where
    P: AsRef<Path>,
    R: PageRenderer + 'static,
    D: RegionDetector + 'static,
{
    let document = open_document(path, &options)?;
    let workspace = Workspace::temporary()?;
    TableLocator::new(renderer, detector)
        .with_options(options)
        .locate_tables(&document, &workspace)
}

/// Locate the tables of a PDF file and extract their styled cells with the
/// stream extractor.
pub fn extract_tables<P, R, D>(
    path: P,
    renderer: R,
    detector: D,
    options: LocateOptions,
) -> Result<Vec<LocatedTable>>
where
    P: AsRef<Path>,
    R: PageRenderer + 'static,
    D: RegionDetector + 'static,
{
    let document = open_document(path, &options)?;
    let workspace = Workspace::temporary()?;
    TableLocator::new(renderer, detector)
        .with_options(options)
        .extract_tables(&document, &workspace, &StreamCellExtractor::new())
}
