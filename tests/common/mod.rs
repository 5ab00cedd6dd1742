//! Shared fixtures: synthetic PDFs and mock collaborators.

#![allow(dead_code)]

use image::{DynamicImage, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as LopdfDocument, Object, Stream};
use untable::raster::pixel_size;
use untable::{
    Error, PageRenderer, RasterImage, RawDetection, RegionDetector, Result, SinglePageDocument,
};

/// One page of a synthetic document.
pub struct PageSpec {
    pub operations: Vec<Operation>,
    pub rotate: Option<i64>,
}

impl PageSpec {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            rotate: None,
        }
    }

    pub fn with_rotate(mut self, rotate: i64) -> Self {
        self.rotate = Some(rotate);
        self
    }
}

/// Upright text at `(x, y)`.
pub fn text_at(font: &str, size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// Text running up the page, starting at `(x, y)`.
pub fn text_up(font: &str, size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new(
            "Tm",
            vec![0i64.into(), 1i64.into(), (-1i64).into(), 0i64.into(), x.into(), y.into()],
        ),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// Build a Letter-sized document with Helvetica (`F1`) and Helvetica-Bold
/// (`F2`) available on every page.
pub fn build_pdf(pages: Vec<PageSpec>) -> Vec<u8> {
    let mut doc = LopdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => regular, "F2" => bold },
    });

    let count = pages.len() as i64;
    let mut kids = Vec::new();
    for spec in pages {
        let content = Content {
            operations: spec.operations,
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if let Some(rotate) = spec.rotate {
            page.set("Rotate", rotate);
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Renders a blank image sized like the page as displayed.
pub struct BlankRenderer;

impl PageRenderer for BlankRenderer {
    fn render(&self, pdf: &[u8], dpi: u32) -> Result<DynamicImage> {
        let page = SinglePageDocument::from_bytes(1, pdf.to_vec()).page()?;
        let (w, h) = pixel_size(page.width, page.height, dpi);
        Ok(DynamicImage::ImageRgb8(RgbImage::new(w, h)))
    }
}

/// Reports the same relative box on every page.
pub struct FixedDetector {
    /// `[x1, y1, x2, y2]` as fractions of the image size
    pub relative: [f64; 4],
    /// Pages the detector fails on
    pub failing_pages: Vec<u32>,
}

impl FixedDetector {
    pub fn new(relative: [f64; 4]) -> Self {
        Self {
            relative,
            failing_pages: Vec::new(),
        }
    }

    pub fn failing_on(mut self, page: u32) -> Self {
        self.failing_pages.push(page);
        self
    }
}

impl RegionDetector for FixedDetector {
    fn detect(&self, image: &RasterImage) -> Result<Vec<RawDetection>> {
        if self.failing_pages.contains(&image.page) {
            return Err(Error::Detection(format!("model crashed on page {}", image.page)));
        }
        let w = f64::from(image.width());
        let h = f64::from(image.height());
        let [x1, y1, x2, y2] = self.relative;
        Ok(vec![RawDetection::new(
            untable::ImageBox::new(x1 * w, y1 * h, x2 * w, y2 * h),
            0.93,
            0,
        )])
    }
}
