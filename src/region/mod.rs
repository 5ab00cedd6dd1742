//! Turning detector output into table regions.
//!
//! A [`RegionDetector`] reports boxes in image pixels. [`reconcile`] maps
//! them onto the page, pads them, and applies a fixed correction for pages
//! with one or two tables: detectors tend to crop the header row and to
//! split stacked tables badly, so single regions are stretched and a pair
//! of regions overlapping vertically get a shared boundary moved apart.

use crate::error::{Error, Result};
use crate::geometry::{clamp_to_page, ImageBox, PageFrame, PdfBox, DEFAULT_MARGIN};
use crate::model::{RawDetection, TableRegion};
use crate::parser::LocateOptions;
use crate::raster::RasterImage;

/// Stretch applied to both y coordinates of a lone region.
const SINGLE_REGION_STRETCH: f64 = 1.05;
/// Factor for the lower region's new upper bound in a stacked pair.
const LOWER_REGION_STRETCH: f64 = 1.15;
/// Factor for the upper region's new lower bound in a stacked pair.
const UPPER_REGION_STRETCH: f64 = 1.05;

/// A table-region object detector.
pub trait RegionDetector: Send + Sync {
    /// Detect table regions on a rendered page, in image pixels.
    fn detect(&self, image: &RasterImage) -> Result<Vec<RawDetection>>;
}

/// Padding and filtering applied while reconciling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileOptions {
    /// Horizontal padding ratio
    pub x_margin: f64,
    /// Vertical padding ratio
    pub y_margin: f64,
    /// Drop detections below this confidence
    pub min_confidence: Option<f32>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            x_margin: DEFAULT_MARGIN,
            y_margin: DEFAULT_MARGIN,
            min_confidence: None,
        }
    }
}

impl From<&LocateOptions> for ReconcileOptions {
    fn from(options: &LocateOptions) -> Self {
        Self {
            x_margin: options.x_margin,
            y_margin: options.y_margin,
            min_confidence: options.min_confidence,
        }
    }
}

/// Parse plain-text detector output.
///
/// One detection per line: `x1 y1 x2 y2 [confidence [class]]`, separated by
/// whitespace. Missing confidence defaults to 1 and missing class to 0.
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_detections(output: &str) -> Result<Vec<RawDetection>> {
    let mut detections = Vec::new();
    for (idx, line) in output.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let values = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Detection(format!("line {}: {}", idx + 1, e)))?;

        let (coords, rest) = match values.len() {
            4..=6 => values.split_at(4),
            n => {
                return Err(Error::Detection(format!(
                    "line {}: expected 4 to 6 values, found {}",
                    idx + 1,
                    n
                )))
            }
        };
        let confidence = rest.first().copied().unwrap_or(1.0) as f32;
        let class_id = rest.get(1).copied().unwrap_or(0.0).max(0.0) as u32;

        detections.push(RawDetection::new(
            ImageBox::new(coords[0], coords[1], coords[2], coords[3]),
            confidence,
            class_id,
        ));
    }
    Ok(detections)
}

/// Map detections onto a page and correct them.
///
/// Output keeps the detector's order; every region carries `page`.
pub fn reconcile(
    detections: &[RawDetection],
    frame: PageFrame,
    page: u32,
    options: &ReconcileOptions,
) -> Vec<TableRegion> {
    if !frame.is_valid() {
        log::warn!("Page {}: unusable frame {:?}, no regions", page, frame);
        return Vec::new();
    }

    let mut regions: Vec<TableRegion> = detections
        .iter()
        .filter(|d| match options.min_confidence {
            Some(min) => d.confidence >= min,
            None => true,
        })
        .map(|d| TableRegion {
            page,
            bbox: frame.image_to_pdf(&d.bbox, options.x_margin, options.y_margin),
            confidence: d.confidence,
            class_id: d.class_id,
        })
        .collect();

    match regions.as_mut_slice() {
        [single] => {
            let b = single.bbox;
            single.bbox = PdfBox::new(
                b.x1,
                b.y1 * SINGLE_REGION_STRETCH,
                b.x2,
                b.y2 * SINGLE_REGION_STRETCH,
            );
        }
        [first, second] => separate_stacked(&mut first.bbox, &mut second.bbox),
        _ => {}
    }

    for region in &mut regions {
        region.bbox = clamp_to_page(&region.bbox, frame.pdf_width, frame.pdf_height);
    }

    log::debug!(
        "Page {}: {} detections -> {} regions",
        page,
        detections.len(),
        regions.len()
    );
    regions
}

/// Move the shared boundary of two vertically overlapping regions.
///
/// The region with the smaller lower bound is the lower one; on a tie the
/// first region is. Regions that do not overlap vertically are untouched.
fn separate_stacked(first: &mut PdfBox, second: &mut PdfBox) {
    let overlaps = first.min_y() <= second.max_y() && second.min_y() <= first.max_y();
    if !overlaps {
        return;
    }

    let (lower, upper) = if second.min_y() < first.min_y() {
        (second, first)
    } else {
        (first, second)
    };

    let contested = upper.min_y();
    *lower = with_vertical(lower, lower.min_y(), contested * LOWER_REGION_STRETCH);
    *upper = with_vertical(upper, contested * UPPER_REGION_STRETCH, upper.max_y());
}

fn with_vertical(bbox: &PdfBox, lower: f64, upper: f64) -> PdfBox {
    PdfBox::new(bbox.min_x(), upper, bbox.max_x(), lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(x1: f64, y1: f64, x2: f64, y2: f64) -> RawDetection {
        RawDetection::new(ImageBox::new(x1, y1, x2, y2), 0.9, 0)
    }

    fn unpadded() -> ReconcileOptions {
        ReconcileOptions {
            x_margin: 0.0,
            y_margin: 0.0,
            min_confidence: None,
        }
    }

    #[test]
    fn test_parse_detections() {
        let output = "120 340 980 1200 0.91 0\n\n# comment\n10 20 30 40\n";
        let detections = parse_detections(output).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].bbox, ImageBox::new(120.0, 340.0, 980.0, 1200.0));
        assert!((detections[0].confidence - 0.91).abs() < 1e-6);
        assert_eq!(detections[1].confidence, 1.0);
        assert_eq!(detections[1].class_id, 0);
    }

    #[test]
    fn test_parse_detections_rejects_garbage() {
        assert!(matches!(
            parse_detections("1 2 3"),
            Err(Error::Detection(_))
        ));
        assert!(matches!(
            parse_detections("1 2 three 4"),
            Err(Error::Detection(_))
        ));
    }

    #[test]
    fn test_single_region_stretch() {
        // 612x792 page rendered at 72 dpi: pixels equal points
        let frame = PageFrame::new(612.0, 792.0, 612, 792);
        let regions = reconcile(&[detection(50.0, 592.0, 500.0, 692.0)], frame, 2, &unpadded());

        assert_eq!(regions.len(), 1);
        let bbox = regions[0].bbox;
        assert_eq!(regions[0].page, 2);
        assert!((bbox.y1 - 200.0 * 1.05).abs() < 1e-9);
        assert!((bbox.y2 - 100.0 * 1.05).abs() < 1e-9);
        assert!((bbox.x1 - 50.0).abs() < 1e-9 && (bbox.x2 - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_stacked_pair() {
        let mut a = PdfBox::new(10.0, 200.0, 300.0, 100.0);
        let mut b = PdfBox::new(10.0, 300.0, 300.0, 190.0);
        separate_stacked(&mut a, &mut b);

        assert!((a.y1 - 218.5).abs() < 1e-9);
        assert_eq!(a.y2, 100.0);
        assert!((b.y2 - 199.5).abs() < 1e-9);
        assert_eq!(b.y1, 300.0);
    }

    #[test]
    fn test_stacked_pair_in_either_order() {
        let mut a = PdfBox::new(10.0, 300.0, 300.0, 190.0);
        let mut b = PdfBox::new(10.0, 200.0, 300.0, 100.0);
        separate_stacked(&mut a, &mut b);

        assert!((b.y1 - 218.5).abs() < 1e-9);
        assert!((a.y2 - 199.5).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_pair_untouched() {
        let frame = PageFrame::new(612.0, 792.0, 612, 792);
        let detections = [
            detection(50.0, 100.0, 500.0, 200.0),
            detection(50.0, 400.0, 500.0, 500.0),
        ];
        let regions = reconcile(&detections, frame, 1, &unpadded());
        assert!(regions[0].bbox.approx_eq(&PdfBox::new(50.0, 692.0, 500.0, 592.0), 1e-9));
        assert!(regions[1].bbox.approx_eq(&PdfBox::new(50.0, 392.0, 500.0, 292.0), 1e-9));
    }

    #[test]
    fn test_three_regions_unchanged_and_ordered() {
        let frame = PageFrame::new(612.0, 792.0, 612, 792);
        let detections = [
            detection(50.0, 100.0, 500.0, 200.0),
            detection(50.0, 150.0, 500.0, 300.0),
            detection(50.0, 600.0, 500.0, 700.0),
        ];
        let regions = reconcile(&detections, frame, 1, &unpadded());
        assert_eq!(regions.len(), 3);
        assert!(regions[0].bbox.approx_eq(&PdfBox::new(50.0, 692.0, 500.0, 592.0), 1e-9));
        assert!(regions[1].bbox.approx_eq(&PdfBox::new(50.0, 642.0, 500.0, 492.0), 1e-9));
        assert!(regions[2].bbox.approx_eq(&PdfBox::new(50.0, 192.0, 500.0, 92.0), 1e-9));
    }

    #[test]
    fn test_stretch_is_clamped() {
        let frame = PageFrame::new(612.0, 792.0, 612, 792);
        let regions = reconcile(&[detection(0.0, 0.0, 612.0, 300.0)], frame, 1, &unpadded());
        let bbox = regions[0].bbox;
        assert_eq!(bbox.y1, 792.0);
        assert!(bbox.y2 <= 792.0 && bbox.y2 >= 0.0);
    }

    #[test]
    fn test_min_confidence_filter() {
        let frame = PageFrame::new(612.0, 792.0, 612, 792);
        let detections = [
            RawDetection::new(ImageBox::new(50.0, 100.0, 500.0, 200.0), 0.2, 0),
            RawDetection::new(ImageBox::new(50.0, 400.0, 500.0, 500.0), 0.8, 1),
        ];
        let options = ReconcileOptions {
            min_confidence: Some(0.5),
            ..unpadded()
        };
        let regions = reconcile(&detections, frame, 1, &options);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].class_id, 1);
    }
}
