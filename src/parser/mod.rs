//! PDF parsing: documents, page text and rotation.

mod content;
mod document;
mod options;
mod rotation;
mod stream;

pub use content::{group_runs_into_lines, ContentOptions, ContentParser};
pub use document::{Document, SinglePageDocument};
pub use options::{ErrorMode, LocateOptions, PageSelection, PageSpan, DEFAULT_DPI};
pub use rotation::{classify_rotation, correct_rotation, detect_rotation, upright};
pub use stream::{CellExtractor, StreamCellExtractor, StreamConfig};
