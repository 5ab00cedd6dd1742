//! Page rotation detection and correction.
//!
//! Only quarter turns are handled. A page counts as rotated when more of
//! its text runs advance vertically than horizontally; the direction is then
//! voted per glyph using the sign pattern of each run's rendering matrix.

use lopdf::Object;

use crate::error::{Error, Result};
use crate::model::{GlyphDirection, Page, Rotation, TextRun};

use super::content::ContentOptions;
use super::document::{page_rotate, SinglePageDocument};

/// Classify text runs into a rotation state.
///
/// Returns [`Rotation::None`] when there is no text to discriminate on or
/// when horizontal runs are at least as common as vertical ones.
pub fn classify_rotation<'a, I>(runs: I) -> Rotation
where
    I: IntoIterator<Item = &'a TextRun>,
{
    let mut horizontal = 0usize;
    let mut vertical = 0usize;
    let mut clockwise = 0usize;
    let mut anticlockwise = 0usize;

    for run in runs {
        let glyphs = run.glyph_count();
        if glyphs == 0 {
            continue;
        }
        if run.is_horizontal() {
            horizontal += 1;
            continue;
        }
        vertical += 1;
        match run.direction() {
            GlyphDirection::Clockwise => clockwise += glyphs,
            GlyphDirection::Anticlockwise => anticlockwise += glyphs,
            GlyphDirection::Horizontal => {}
        }
    }

    if vertical == 0 || horizontal >= vertical {
        return Rotation::None;
    }

    log::debug!(
        "Rotated text: {} vertical vs {} horizontal runs, {} clockwise / {} anticlockwise glyphs",
        vertical,
        horizontal,
        clockwise,
        anticlockwise
    );

    if clockwise < anticlockwise {
        Rotation::Anticlockwise
    } else {
        Rotation::Clockwise
    }
}

/// Rotation state of a page, detected when it was loaded.
pub fn detect_rotation(page: &Page) -> Rotation {
    page.rotation()
}

/// Adjust the page's `/Rotate` entry so its text reads upright.
///
/// Anticlockwise pages get `+90`, clockwise pages `-90`, normalized into
/// `0..360`. [`Rotation::None`] returns an identical copy of the input.
pub fn correct_rotation(
    single: &SinglePageDocument,
    rotation: Rotation,
) -> Result<SinglePageDocument> {
    if !rotation.is_rotated() {
        return Ok(single.clone());
    }

    let mut doc = single.load()?;
    let page_id = doc
        .get_pages()
        .values()
        .next()
        .copied()
        .ok_or_else(|| Error::PdfParse("Document has no pages".to_string()))?;

    let current = page_rotate(&doc, page_id);
    let updated = (current + rotation.rotate_delta()).rem_euclid(360);
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)?
        .set("Rotate", updated);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    log::debug!(
        "Page {}: /Rotate {} -> {} ({:?})",
        single.page_number(),
        current,
        updated,
        rotation
    );

    Ok(single.with_rotation(bytes, rotation))
}

/// Load a page, correcting its rotation when needed.
///
/// Returns the (possibly rotated) single-page document together with the
/// page as it reads after correction.
pub fn upright(
    single: &SinglePageDocument,
    options: &ContentOptions,
) -> Result<(SinglePageDocument, Page)> {
    let page = single.page_with_options(options.clone())?;
    let rotation = detect_rotation(&page);
    if !rotation.is_rotated() {
        return Ok((single.clone(), page));
    }

    let corrected = correct_rotation(single, rotation)?;
    let page = corrected.page_with_options(options.clone())?;
    if page.rotation().is_rotated() {
        log::warn!(
            "Page {} still reads {:?} after correction",
            page.number,
            page.rotation()
        );
    }
    Ok((corrected, page))
}
