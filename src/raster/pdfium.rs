//! Renderer backed by the pdfium shared library.

use std::sync::Mutex;

use image::DynamicImage;
use pdfium_render::prelude::*;

use super::{PageRenderer, POINTS_PER_INCH};
use crate::error::{Error, Result};

/// Renders pages with pdfium.
///
/// The library is looked up next to the executable first, then on the
/// system library path. Calls are serialized; pdfium is not reentrant.
pub struct PdfiumRenderer {
    pdfium: Mutex<Pdfium>,
}

impl PdfiumRenderer {
    /// Bind to the pdfium library.
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| Error::Other(format!("Failed to load pdfium: {}", e)))?;
        Ok(Self {
            pdfium: Mutex::new(Pdfium::new(bindings)),
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render(&self, pdf: &[u8], dpi: u32) -> Result<DynamicImage> {
        let pdfium = self
            .pdfium
            .lock()
            .map_err(|_| Error::Other("pdfium lock poisoned".to_string()))?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        let page = document
            .pages()
            .first()
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let scale = f64::from(dpi) / POINTS_PER_INCH;
        let width = (f64::from(page.width().value) * scale).round() as i32;
        let height = (f64::from(page.height().value) * scale).round() as i32;

        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(width)
                    .set_target_height(height)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(bitmap.as_image())
    }
}
