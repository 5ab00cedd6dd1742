//! Page-level types.

use super::TextRun;
use crate::geometry::PdfBox;
use serde::{Deserialize, Serialize};

/// Orientation of a page's text relative to its display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    /// Text reads upright
    #[default]
    None,
    /// Text is turned clockwise and needs a -90° page rotation
    Clockwise,
    /// Text is turned anticlockwise and needs a +90° page rotation
    Anticlockwise,
}

impl Rotation {
    /// Change to the page's `/Rotate` entry that makes text upright.
    pub fn rotate_delta(&self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise => -90,
            Rotation::Anticlockwise => 90,
        }
    }

    /// Whether the page needs correcting.
    pub fn is_rotated(&self) -> bool {
        *self != Rotation::None
    }
}

/// A line of text runs sharing a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Runs in reading order
    pub runs: Vec<TextRun>,
}

impl TextLine {
    /// Create a line, ordering runs left to right.
    pub fn from_runs(mut runs: Vec<TextRun>) -> Self {
        runs.sort_by(|a, b| a.bbox.min_x().total_cmp(&b.bbox.min_x()));
        Self { runs }
    }

    /// Run texts joined with single spaces.
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|r| r.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Box covering every run.
    pub fn bbox(&self) -> PdfBox {
        let mut runs = self.runs.iter();
        match runs.next() {
            Some(first) => runs.fold(first.bbox, |acc, r| acc.union(&r.bbox)),
            None => PdfBox::zero(),
        }
    }

    /// Largest font size on the line.
    pub fn font_size(&self) -> f64 {
        self.runs.iter().map(|r| r.size).fold(0.0, f64::max)
    }

    /// Whether the line has no visible text.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }
}

/// A single page loaded for table location.
///
/// Width, height and text geometry are in display space, i.e. after the
/// page's `/Rotate` entry has been applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points
    pub width: f64,

    /// Page height in points
    pub height: f64,

    /// The page's `/Rotate` entry in degrees (0, 90, 180, 270)
    pub rotate: i64,

    /// Text lines, top to bottom
    pub lines: Vec<TextLine>,

    rotation: Rotation,
}

impl Page {
    /// Create a page; rotation is detected from the lines once, here.
    pub fn new(number: u32, width: f64, height: f64, rotate: i64, lines: Vec<TextLine>) -> Self {
        let rotation = crate::parser::classify_rotation(lines.iter().flat_map(|l| l.runs.iter()));
        Self {
            number,
            width,
            height,
            rotate,
            lines,
            rotation,
        }
    }

    /// Create a page with standard Letter size and no text.
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0, 0, Vec::new())
    }

    /// Rotation detected when the page was loaded.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Iterate over every run on the page.
    pub fn runs(&self) -> impl Iterator<Item = &TextRun> {
        self.lines.iter().flat_map(|l| l.runs.iter())
    }

    /// Page bounds as a box.
    pub fn bounds(&self) -> PdfBox {
        PdfBox::new(0.0, self.height, self.width, 0.0)
    }

    /// Check if the page carries no text.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(TextLine::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f64, y: f64) -> TextRun {
        TextRun::new(text, PdfBox::new(x, y + 10.0, x + 30.0, y), 10.0)
    }

    #[test]
    fn test_line_orders_runs() {
        let line = TextLine::from_runs(vec![run("b", 100.0, 0.0), run("a", 10.0, 0.0)]);
        assert_eq!(line.text(), "a b");
        assert_eq!(line.bbox().to_array(), [10.0, 10.0, 130.0, 0.0]);
    }

    #[test]
    fn test_line_text_skips_blank_runs() {
        let line = TextLine::from_runs(vec![run(" x ", 0.0, 0.0), run("  ", 40.0, 0.0)]);
        assert_eq!(line.text(), "x");
    }

    #[test]
    fn test_rotation_delta() {
        assert_eq!(Rotation::None.rotate_delta(), 0);
        assert_eq!(Rotation::Clockwise.rotate_delta(), -90);
        assert_eq!(Rotation::Anticlockwise.rotate_delta(), 90);
    }

    #[test]
    fn test_upright_page() {
        let page = Page::new(
            1,
            612.0,
            792.0,
            0,
            vec![TextLine::from_runs(vec![run("Hello", 72.0, 700.0)])],
        );
        assert_eq!(page.rotation(), Rotation::None);
        assert!(!page.is_empty());
        assert_eq!(page.runs().count(), 1);
        assert!(Page::letter(2).is_empty());
    }
}
