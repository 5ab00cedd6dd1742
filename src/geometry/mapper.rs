//! Conversions between image, normalized and PDF space.

use super::{ImageBox, NormalizedBox, PdfBox};

/// Default horizontal and vertical padding ratio.
pub const DEFAULT_MARGIN: f64 = 0.025;

/// Scale an image-space box into `[0, 1]`.
pub fn to_normalized(bbox: &ImageBox, image_width: u32, image_height: u32) -> NormalizedBox {
    let w = f64::from(image_width);
    let h = f64::from(image_height);
    NormalizedBox::new(bbox.x1 / w, bbox.y1 / h, bbox.x2 / w, bbox.y2 / h)
}

/// Grow a normalized box.
///
/// Each side moves outward by `x_margin × width`; the top and bottom move by
/// half of `y_margin × height`. Margins of zero return the box unchanged.
pub fn pad(bbox: &NormalizedBox, x_margin: f64, y_margin: f64) -> NormalizedBox {
    let dx = (bbox.x2 - bbox.x1) * x_margin;
    let dy = (bbox.y2 - bbox.y1) * y_margin / 2.0;
    NormalizedBox::new(bbox.x1 - dx, bbox.y1 - dy, bbox.x2 + dx, bbox.y2 + dy)
}

/// Map a normalized box onto a page of `pdf_width × pdf_height` units.
///
/// The y axis is flipped (`y' = (1 - y) × H`) and the result is clamped to
/// the page.
pub fn to_pdf_absolute(bbox: &NormalizedBox, pdf_width: f64, pdf_height: f64) -> PdfBox {
    let raw = PdfBox::new(
        bbox.x1 * pdf_width,
        (1.0 - bbox.y1) * pdf_height,
        bbox.x2 * pdf_width,
        (1.0 - bbox.y2) * pdf_height,
    );
    clamp_to_page(&raw, pdf_width, pdf_height)
}

/// Map a PDF-space box back to image pixels. Inverse of
/// [`to_pdf_absolute`] composed with [`to_normalized`].
pub fn to_image(
    bbox: &PdfBox,
    pdf_width: f64,
    pdf_height: f64,
    image_width: u32,
    image_height: u32,
) -> ImageBox {
    let sx = f64::from(image_width) / pdf_width;
    let ih = f64::from(image_height);
    ImageBox::new(
        bbox.x1 * sx,
        (1.0 - bbox.y1 / pdf_height) * ih,
        bbox.x2 * sx,
        (1.0 - bbox.y2 / pdf_height) * ih,
    )
}

/// Clamp every coordinate into `[0, W] × [0, H]`.
pub fn clamp_to_page(bbox: &PdfBox, pdf_width: f64, pdf_height: f64) -> PdfBox {
    let clamped = PdfBox::new(
        bbox.x1.clamp(0.0, pdf_width),
        bbox.y1.clamp(0.0, pdf_height),
        bbox.x2.clamp(0.0, pdf_width),
        bbox.y2.clamp(0.0, pdf_height),
    );
    if clamped != *bbox {
        log::warn!(
            "Box {} exceeds page {}x{}, clamped to {}",
            bbox,
            pdf_width,
            pdf_height,
            clamped
        );
    }
    clamped
}

/// Dimensions of one page in both spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// Page width in PDF units
    pub pdf_width: f64,
    /// Page height in PDF units
    pub pdf_height: f64,
    /// Raster width in pixels
    pub image_width: u32,
    /// Raster height in pixels
    pub image_height: u32,
}

impl PageFrame {
    /// Create a frame.
    pub fn new(pdf_width: f64, pdf_height: f64, image_width: u32, image_height: u32) -> Self {
        Self {
            pdf_width,
            pdf_height,
            image_width,
            image_height,
        }
    }

    /// Image box to PDF box with padding applied in normalized space.
    pub fn image_to_pdf(&self, bbox: &ImageBox, x_margin: f64, y_margin: f64) -> PdfBox {
        let normalized = to_normalized(bbox, self.image_width, self.image_height);
        let padded = pad(&normalized, x_margin, y_margin);
        to_pdf_absolute(&padded, self.pdf_width, self.pdf_height)
    }

    /// PDF box to image box.
    pub fn pdf_to_image(&self, bbox: &PdfBox) -> ImageBox {
        to_image(
            bbox,
            self.pdf_width,
            self.pdf_height,
            self.image_width,
            self.image_height,
        )
    }

    /// Whether both spaces have a usable, non-zero size.
    pub fn is_valid(&self) -> bool {
        self.image_width > 0
            && self.image_height > 0
            && self.pdf_width.is_finite()
            && self.pdf_height.is_finite()
            && self.pdf_width > 0.0
            && self.pdf_height > 0.0
    }
}
