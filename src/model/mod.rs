//! Data model shared by the pipeline stages.
//!
//! Pages and text runs come out of the content parser, raw detections out
//! of a region detector, and cell grids out of a table parser. Everything
//! here is plain data with serde derives.

mod cell;
mod page;
mod region;
mod text;

pub use cell::{Cell, CellGrid};
pub use page::{Page, Rotation, TextLine};
pub use region::{RawDetection, TableRegion};
pub use text::{GlyphDirection, SpanStyle, StyleFlags, StyleVariant, TextRun};
