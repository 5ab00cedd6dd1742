//! Cell style recovery.
//!
//! Table parsers return plain cell text. To tell headers from body rows we
//! need the font behind each cell, so the page's text lines are indexed by
//! their normalized text and cells are looked up by theirs.

mod index;
mod table;

pub use index::{build_style_index, normalize_identifier, LineStyles, StyleIndex};
pub use table::{
    attach_styles, extract_table_styles, normalize_cell_text, resolve_cell_style,
    StyleAttribute, StyleValue, TableStyles,
};
