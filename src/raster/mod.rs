//! Page rasterization.
//!
//! Rendering itself is delegated to a [`PageRenderer`]; this module fixes
//! the resolution, attaches the page number to failures and optionally
//! caches the image on disk.

#[cfg(feature = "pdfium")]
mod pdfium;

#[cfg(feature = "pdfium")]
pub use self::pdfium::PdfiumRenderer;

use std::path::Path;

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::parser::SinglePageDocument;

/// PDF user space units per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Renders single-page PDFs to raster images.
pub trait PageRenderer: Send + Sync {
    /// Render the only page of `pdf` at `dpi`.
    fn render(&self, pdf: &[u8], dpi: u32) -> Result<DynamicImage>;
}

/// A rendered page.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// Page number (1-indexed)
    pub page: u32,
    /// Rendered pixels
    pub image: DynamicImage,
    /// Resolution the page was rendered at
    pub dpi: u32,
}

impl RasterImage {
    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Write the image; the format follows the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }
}

/// Pixel size of a page of `width` x `height` points at `dpi`.
pub fn pixel_size(width: f64, height: f64, dpi: u32) -> (u32, u32) {
    let scale = f64::from(dpi) / POINTS_PER_INCH;
    (
        (width * scale).round().max(1.0) as u32,
        (height * scale).round().max(1.0) as u32,
    )
}

/// Render a single-page document.
///
/// When `cache_path` is given the image is also written there.
pub fn rasterize(
    single: &SinglePageDocument,
    dpi: u32,
    renderer: &dyn PageRenderer,
    cache_path: Option<&Path>,
) -> Result<RasterImage> {
    let page = single.page_number();
    let image = renderer
        .render(single.bytes(), dpi)
        .map_err(|e| match e {
            Error::Render { .. } => e,
            other => Error::Render {
                page,
                message: other.to_string(),
            },
        })?;

    if image.width() == 0 || image.height() == 0 {
        return Err(Error::Render {
            page,
            message: "renderer returned an empty image".to_string(),
        });
    }
    log::debug!(
        "Page {}: rendered {}x{} at {} dpi",
        page,
        image.width(),
        image.height(),
        dpi
    );

    let raster = RasterImage { page, image, dpi };
    if let Some(path) = cache_path {
        raster.save(path)?;
    }
    Ok(raster)
}
