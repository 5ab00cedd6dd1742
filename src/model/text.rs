//! Text runs and their visual style.

use crate::geometry::PdfBox;
use serde::{Deserialize, Serialize};

/// Style flag bits carried by a text run.
///
/// The bit layout is the one table-style consumers expect:
/// superscript = 1, italic = 2, serif = 4, monospaced = 8, bold = 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleFlags(pub u32);

impl StyleFlags {
    /// Text is raised above the baseline
    pub const SUPERSCRIPT: u32 = 1;
    /// Slanted glyphs
    pub const ITALIC: u32 = 2;
    /// Serif typeface
    pub const SERIFED: u32 = 4;
    /// Fixed-pitch typeface
    pub const MONOSPACED: u32 = 8;
    /// Heavy stroke weight
    pub const BOLD: u32 = 16;

    /// Whether a flag bit is set.
    pub fn contains(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    /// Set a flag bit.
    pub fn insert(&mut self, bit: u32) {
        self.0 |= bit;
    }

    /// Collapse the bits into a single variant.
    pub fn variant(&self) -> StyleVariant {
        StyleVariant::from_flags(self.0)
    }
}

/// Dominant style of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleVariant {
    /// Raised text (footnote markers, exponents)
    #[default]
    Superscripted,
    /// Italic text
    Italic,
    /// Serif text
    Serifed,
    /// Monospaced text
    Monospaced,
    /// Bold text
    Bold,
}

impl StyleVariant {
    /// Pick a variant by comparing the raw flag value against thresholds.
    ///
    /// The comparison is on the whole value, not on single bits: any value
    /// above 8 is bold, so a bold serif run reads as bold.
    pub fn from_flags(flags: u32) -> Self {
        match flags {
            0..=1 => StyleVariant::Superscripted,
            2 => StyleVariant::Italic,
            3..=4 => StyleVariant::Serifed,
            5..=8 => StyleVariant::Monospaced,
            _ => StyleVariant::Bold,
        }
    }

    /// Lowercase name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleVariant::Superscripted => "superscripted",
            StyleVariant::Italic => "italic",
            StyleVariant::Serifed => "serifed",
            StyleVariant::Monospaced => "monospaced",
            StyleVariant::Bold => "bold",
        }
    }
}

impl std::fmt::Display for StyleVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way glyphs advance relative to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphDirection {
    /// Left to right along the x axis
    Horizontal,
    /// Glyphs advance toward the bottom of the page
    Clockwise,
    /// Glyphs advance toward the top of the page
    Anticlockwise,
}

/// A run of text drawn with one font, size and colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Decoded text
    pub text: String,
    /// Font family (base font name without subset prefix)
    pub font: String,
    /// Font size in points
    pub size: f64,
    /// Fill colour as 0xRRGGBB
    pub color: u32,
    /// Style flag bits
    pub flags: StyleFlags,
    /// Bounding box on the page
    pub bbox: PdfBox,
    /// Linear part `[a, b, c, d]` of the rendering matrix
    pub transform: [f64; 4],
}

impl TextRun {
    /// Create an upright run with default style.
    pub fn new(text: impl Into<String>, bbox: PdfBox, size: f64) -> Self {
        Self {
            text: text.into(),
            font: String::new(),
            size,
            color: 0,
            flags: StyleFlags::default(),
            bbox,
            transform: [1.0, 0.0, 0.0, 1.0],
        }
    }

    /// Set the font family.
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    /// Set the fill colour.
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Set the style flags.
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = StyleFlags(flags);
        self
    }

    /// Set the rendering matrix.
    pub fn with_transform(mut self, transform: [f64; 4]) -> Self {
        self.transform = transform;
        self
    }

    /// Style variant derived from the flags.
    pub fn variant(&self) -> StyleVariant {
        self.flags.variant()
    }

    /// Colour as lowercase hex without a prefix.
    pub fn color_hex(&self) -> String {
        format!("{:x}", self.color)
    }

    /// Number of characters, ignoring whitespace.
    pub fn glyph_count(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }

    /// Whether the run advances mainly along the x axis.
    pub fn is_horizontal(&self) -> bool {
        let [a, b, _, _] = self.transform;
        a.abs() >= b.abs()
    }

    /// Direction of glyph advance.
    pub fn direction(&self) -> GlyphDirection {
        if self.is_horizontal() {
            return GlyphDirection::Horizontal;
        }
        let [_, b, c, _] = self.transform;
        if b < 0.0 && c > 0.0 {
            GlyphDirection::Clockwise
        } else if b > 0.0 && c < 0.0 {
            GlyphDirection::Anticlockwise
        } else {
            GlyphDirection::Horizontal
        }
    }
}

/// Style record for one span of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanStyle {
    /// Font size in points
    pub size: f64,
    /// Dominant style
    pub variant: StyleVariant,
    /// Font family
    pub font: String,
    /// Fill colour as 0xRRGGBB
    pub color: u32,
    /// Bounding box on the page
    pub bbox: PdfBox,
}

impl SpanStyle {
    /// Colour as lowercase hex without a prefix.
    pub fn color_hex(&self) -> String {
        format!("{:x}", self.color)
    }
}

impl From<&TextRun> for SpanStyle {
    fn from(run: &TextRun) -> Self {
        Self {
            size: run.size,
            variant: run.variant(),
            font: run.font.clone(),
            color: run.color,
            bbox: run.bbox,
        }
    }
}
