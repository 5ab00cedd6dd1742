//! Detector output and table regions.

use crate::geometry::{ImageBox, PdfBox};
use serde::{Deserialize, Serialize};

/// One box reported by a region detector, in image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Box on the raster image
    pub bbox: ImageBox,
    /// Detector confidence in `[0, 1]`
    pub confidence: f32,
    /// Detector class id
    pub class_id: u32,
}

impl RawDetection {
    /// Create a detection.
    pub fn new(bbox: ImageBox, confidence: f32, class_id: u32) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
        }
    }
}

/// A table region on a PDF page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRegion {
    /// Page number (1-indexed)
    pub page: u32,
    /// Region in PDF units; `(x1, y1)` is the top-left corner
    pub bbox: PdfBox,
    /// Confidence of the originating detection
    pub confidence: f32,
    /// Class id of the originating detection
    pub class_id: u32,
}

impl TableRegion {
    /// Create a region.
    pub fn new(page: u32, bbox: PdfBox) -> Self {
        Self {
            page,
            bbox,
            confidence: 1.0,
            class_id: 0,
        }
    }

    /// Region as the `"x1,y1,x2,y2"` area string table parsers accept.
    pub fn area(&self) -> String {
        self.bbox.to_string()
    }
}
