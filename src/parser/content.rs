//! Content stream interpretation.
//!
//! Walks a page's content stream and produces positioned [`TextRun`]s with
//! font, size, colour and style flags, then groups them into lines. All
//! geometry is reported in display space, so a page carrying `/Rotate 90`
//! yields runs laid out the way a viewer shows them.

use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::geometry::PdfBox;
use crate::model::{Page, StyleFlags, TextLine, TextRun};

use super::document::{media_box, page_rotate};

/// Line grouping parameters.
#[derive(Debug, Clone)]
pub struct ContentOptions {
    /// Runs whose baselines differ by less than this fraction of the font
    /// size share a line
    pub line_tolerance: f64,
    /// A horizontal gap wider than this many font sizes starts a new line
    pub gap_factor: f64,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            line_tolerance: 0.3,
            gap_factor: 1.0,
        }
    }
}

/// 2D affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }
}

impl Matrix {
    fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Length of the transformed unit y vector.
    fn vertical_scale(&self) -> f64 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        if operands.len() < 6 {
            return None;
        }
        let n: Vec<f64> = operands[..6].iter().filter_map(get_number).collect();
        (n.len() == 6).then(|| Matrix::new(n[0], n[1], n[2], n[3], n[4], n[5]))
    }
}

/// Maps content space onto display space for a given `/Rotate`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DisplayTransform {
    origin_x: f64,
    origin_y: f64,
    width: f64,
    height: f64,
    rotate: i64,
}

impl DisplayTransform {
    pub(crate) fn new(media: [f64; 4], rotate: i64) -> Self {
        Self {
            origin_x: media[0].min(media[2]),
            origin_y: media[1].min(media[3]),
            width: (media[2] - media[0]).abs(),
            height: (media[3] - media[1]).abs(),
            rotate: rotate.rem_euclid(360),
        }
    }

    /// Display width and height.
    pub(crate) fn size(&self) -> (f64, f64) {
        match self.rotate {
            90 | 270 => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }

    fn point(&self, x: f64, y: f64) -> (f64, f64) {
        let (x, y) = (x - self.origin_x, y - self.origin_y);
        match self.rotate {
            90 => (y, self.width - x),
            180 => (self.width - x, self.height - y),
            270 => (self.height - y, x),
            _ => (x, y),
        }
    }

    fn vector(&self, vx: f64, vy: f64) -> (f64, f64) {
        match self.rotate {
            90 => (vy, -vx),
            180 => (-vx, -vy),
            270 => (-vy, vx),
            _ => (vx, vy),
        }
    }

    fn bbox(&self, bbox: &PdfBox) -> PdfBox {
        let (ax, ay) = self.point(bbox.x1, bbox.y1);
        let (bx, by) = self.point(bbox.x2, bbox.y2);
        PdfBox::from_corners(ax, ay, bx, by)
    }

    /// Move a run from content space into display space.
    pub(crate) fn run(&self, mut run: TextRun) -> TextRun {
        let [a, b, c, d] = run.transform;
        let (a, b) = self.vector(a, b);
        let (c, d) = self.vector(c, d);
        run.transform = [a, b, c, d];
        run.bbox = self.bbox(&run.bbox);
        run
    }
}

/// Font data needed to place and style text.
#[derive(Debug, Clone, Default)]
struct FontInfo {
    /// Base font name without subset prefix
    name: String,
    /// Font descriptor flags
    descriptor_flags: u32,
    first_char: u32,
    widths: Vec<f64>,
    missing_width: f64,
    two_byte: bool,
}

impl FontInfo {
    fn glyph_width(&self, code: u32) -> f64 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.missing_width)
    }

    fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|c| match c {
                    [hi, lo] => u32::from(*hi) << 8 | u32::from(*lo),
                    [b] => u32::from(*b),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }

    /// Style bits from descriptor flags, the font name and text rise.
    fn style_flags(&self, rise: f64) -> StyleFlags {
        let lower = self.name.to_lowercase();
        let mut flags = StyleFlags::default();
        if rise > 0.0 {
            flags.insert(StyleFlags::SUPERSCRIPT);
        }
        if self.descriptor_flags & 64 != 0
            || lower.contains("italic")
            || lower.contains("oblique")
        {
            flags.insert(StyleFlags::ITALIC);
        }
        if self.descriptor_flags & 2 != 0
            || ((lower.contains("times") || lower.contains("serif")) && !lower.contains("sans"))
        {
            flags.insert(StyleFlags::SERIFED);
        }
        if self.descriptor_flags & 1 != 0 || lower.contains("courier") || lower.contains("mono") {
            flags.insert(StyleFlags::MONOSPACED);
        }
        if self.descriptor_flags & (1 << 18) != 0
            || lower.contains("bold")
            || lower.contains("black")
            || lower.contains("heavy")
        {
            flags.insert(StyleFlags::BOLD);
        }
        flags
    }
}

/// Text state parameters, saved and restored with the graphics state.
#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct GraphicsState {
    ctm: Matrix,
    fill: u32,
    text: TextState,
}

/// Extracts styled text runs from pages of a document.
pub struct ContentParser<'a> {
    doc: &'a LopdfDocument,
    options: ContentOptions,
}

impl<'a> ContentParser<'a> {
    /// Create a parser with default options.
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self::with_options(doc, ContentOptions::default())
    }

    /// Create a parser with custom options.
    pub fn with_options(doc: &'a LopdfDocument, options: ContentOptions) -> Self {
        Self { doc, options }
    }

    /// Load a page with its text grouped into lines.
    ///
    /// `page_num` indexes this document; `label` is the number the page
    /// carries in the caller's document.
    pub fn load_page(&self, page_num: u32, label: u32) -> Result<Page> {
        let page_id = self.page_id(page_num)?;
        let media = media_box(self.doc, page_id);
        let rotate = page_rotate(self.doc, page_id);
        let display = DisplayTransform::new(media, rotate);

        let runs: Vec<TextRun> = self
            .extract_runs(page_id)?
            .into_iter()
            .map(|r| display.run(r))
            .collect();
        log::debug!("Page {}: {} text runs", label, runs.len());

        let lines = group_runs_into_lines(runs, &self.options);
        log::debug!("Page {}: {} lines", label, lines.len());

        let (width, height) = display.size();
        Ok(Page::new(label, width, height, rotate, lines))
    }

    /// Extract runs from a page in content space.
    pub fn extract_page_runs(&self, page_num: u32) -> Result<Vec<TextRun>> {
        let page_id = self.page_id(page_num)?;
        self.extract_runs(page_id)
    }

    fn page_id(&self, page_num: u32) -> Result<ObjectId> {
        let pages = self.doc.get_pages();
        pages
            .get(&page_num)
            .copied()
            .ok_or(Error::PageOutOfRange(page_num, pages.len() as u32))
    }

    fn extract_runs(&self, page_id: ObjectId) -> Result<Vec<TextRun>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let fonts: HashMap<Vec<u8>, FontInfo> = lopdf_fonts
            .iter()
            .map(|(key, dict)| (key.clone(), self.font_info(dict)))
            .collect();

        let content = match self.page_content(page_id)? {
            Some(content) => content,
            None => return Ok(Vec::new()),
        };
        self.interpret(&content, &fonts, &lopdf_fonts)
    }

    fn page_content(&self, page_id: ObjectId) -> Result<Option<Vec<u8>>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            Err(_) => return Ok(None),
        };

        let refs: Vec<ObjectId> = match contents {
            Object::Reference(r) => vec![*r],
            Object::Array(arr) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
            _ => return Err(Error::PdfParse("Invalid content stream".to_string())),
        };

        let mut content = Vec::new();
        for r in refs {
            match self.doc.get_object(r) {
                Ok(Object::Stream(s)) => {
                    let data = s
                        .decompressed_content()
                        .unwrap_or_else(|_| s.content.clone());
                    content.extend_from_slice(&data);
                    content.push(b'\n');
                }
                _ => log::warn!("Skipping content object {:?}: not a stream", r),
            }
        }
        Ok(Some(content))
    }

    fn font_info(&self, font: &Dictionary) -> FontInfo {
        let name = font
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| strip_subset_prefix(&String::from_utf8_lossy(n)))
            .unwrap_or_else(|| "Unknown".to_string());

        let two_byte = font
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|s| s == b"Type0");

        // Composite fonts keep their descriptor on the descendant font.
        let descendant = if two_byte {
            font.get(b"DescendantFonts")
                .ok()
                .and_then(|o| self.resolve(o))
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .and_then(|o| self.resolve(o))
                .and_then(|o| o.as_dict().ok())
        } else {
            None
        };

        let descriptor_flags = descendant
            .unwrap_or(font)
            .get(b"FontDescriptor")
            .ok()
            .and_then(|o| self.resolve(o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(b"Flags").ok())
            .and_then(|o| o.as_i64().ok())
            .map(|f| f as u32)
            .unwrap_or(0);

        let (first_char, widths, missing_width) = if two_byte {
            let dw = descendant
                .and_then(|d| d.get(b"DW").ok())
                .and_then(get_number)
                .unwrap_or(1000.0);
            (0, Vec::new(), dw)
        } else {
            let first_char = font
                .get(b"FirstChar")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(0)
                .max(0) as u32;
            let widths = font
                .get(b"Widths")
                .ok()
                .and_then(|o| self.resolve(o))
                .and_then(|o| o.as_array().ok())
                .map(|arr| arr.iter().map(|w| get_number(w).unwrap_or(0.0)).collect())
                .unwrap_or_default();
            (first_char, widths, 500.0)
        };

        FontInfo {
            name,
            descriptor_flags,
            first_char,
            widths,
            missing_width,
            two_byte,
        }
    }

    fn resolve<'o>(&'o self, obj: &'o Object) -> Option<&'o Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    fn interpret(
        &self,
        content: &[u8],
        fonts: &HashMap<Vec<u8>, FontInfo>,
        lopdf_fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    ) -> Result<Vec<TextRun>> {
        let content =
            lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut runs = Vec::new();
        let mut state = GraphicsState::default();
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut tm = Matrix::default();
        let mut tlm = Matrix::default();
        let mut in_text_block = false;
        let default_font = FontInfo {
            missing_width: 500.0,
            ..FontInfo::default()
        };

        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => stack.push(state.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        state.ctm = m.then(&state.ctm);
                    }
                }
                "g" | "rg" | "k" | "sc" | "scn" => {
                    if let Some(c) = fill_color(operands) {
                        state.fill = c;
                    }
                }
                "BT" => {
                    in_text_block = true;
                    tm = Matrix::default();
                    tlm = Matrix::default();
                }
                "ET" => in_text_block = false,
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(key) = &operands[0] {
                            state.text.font_key = key.clone();
                        }
                        state.text.size = get_number(&operands[1]).unwrap_or(12.0);
                    }
                }
                "Tc" => set_number(operands, &mut state.text.char_spacing),
                "Tw" => set_number(operands, &mut state.text.word_spacing),
                "TL" => set_number(operands, &mut state.text.leading),
                "Ts" => set_number(operands, &mut state.text.rise),
                "Tz" => {
                    if let Some(v) = operands.first().and_then(get_number) {
                        state.text.horizontal_scale = v / 100.0;
                    }
                }
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            state.text.leading = -ty;
                        }
                        tlm = Matrix::translation(tx, ty).then(&tlm);
                        tm = tlm;
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        tlm = m;
                        tm = m;
                    }
                }
                "T*" => {
                    tlm = Matrix::translation(0.0, -state.text.leading).then(&tlm);
                    tm = tlm;
                }
                "Tj" | "TJ" | "'" | "\"" => {
                    if op.operator == "'" || op.operator == "\"" {
                        if op.operator == "\"" && operands.len() >= 3 {
                            set_number(&operands[0..1], &mut state.text.word_spacing);
                            set_number(&operands[1..2], &mut state.text.char_spacing);
                        }
                        tlm = Matrix::translation(0.0, -state.text.leading).then(&tlm);
                        tm = tlm;
                    }
                    if !in_text_block {
                        continue;
                    }

                    let font = fonts.get(&state.text.font_key).unwrap_or(&default_font);
                    let encoding = lopdf_fonts
                        .get(&state.text.font_key)
                        .and_then(|f| f.get_font_encoding(self.doc).ok());

                    let items: Vec<&Object> = match op.operator.as_str() {
                        "TJ" => match operands.first() {
                            Some(Object::Array(arr)) => arr.iter().collect(),
                            _ => Vec::new(),
                        },
                        "\"" => operands.get(2).into_iter().collect(),
                        _ => operands.first().into_iter().collect(),
                    };

                    let decode = |bytes: &[u8]| match encoding {
                        Some(ref enc) => LopdfDocument::decode_text(enc, bytes)
                            .unwrap_or_else(|_| decode_text_simple(bytes)),
                        None => decode_text_simple(bytes),
                    };
                    let shown = show_text(&items, font, &decode, &state.text);
                    if !shown.text.trim().is_empty() {
                        runs.push(build_run(shown.text, shown.advance, font, &state, &tm));
                    }
                    tm = Matrix::translation(shown.advance, 0.0).then(&tm);
                }
                _ => {}
            }
        }

        Ok(runs)
    }
}

struct ShownText {
    text: String,
    /// Advance in unscaled text space units
    advance: f64,
}

// Threshold for treating a TJ adjustment as a word space, in 1/1000 em.
const TJ_SPACE_THRESHOLD: f64 = 200.0;

fn show_text(
    items: &[&Object],
    font: &FontInfo,
    decode: &dyn Fn(&[u8]) -> String,
    text_state: &TextState,
) -> ShownText {
    let mut text = String::new();
    let mut advance = 0.0;
    let th = text_state.horizontal_scale;

    for item in items {
        match item {
            Object::String(bytes, _) => {
                text.push_str(&decode(bytes));

                for code in font.codes(bytes) {
                    let mut w = font.glyph_width(code) / 1000.0 * text_state.size
                        + text_state.char_spacing;
                    if code == 32 && !font.two_byte {
                        w += text_state.word_spacing;
                    }
                    advance += w * th;
                }
            }
            other => {
                if let Some(n) = get_number(other) {
                    advance -= n / 1000.0 * text_state.size * th;
                    if -n > TJ_SPACE_THRESHOLD
                        && !text.is_empty()
                        && !text.ends_with(' ')
                        && !text.ends_with('\u{00A0}')
                        && !text.chars().last().is_some_and(is_spaceless_script_char)
                    {
                        text.push(' ');
                    }
                }
            }
        }
    }

    ShownText { text, advance }
}

fn build_run(
    text: String,
    advance: f64,
    font: &FontInfo,
    state: &GraphicsState,
    tm: &Matrix,
) -> TextRun {
    let m = tm.then(&state.ctm);
    let size = state.text.size;
    let rise = state.text.rise;
    let bottom = rise - 0.2 * size;
    let top = rise + 0.8 * size;

    let corners = [
        m.apply(0.0, bottom),
        m.apply(advance, bottom),
        m.apply(0.0, top),
        m.apply(advance, top),
    ];
    let min_x = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    TextRun {
        text,
        font: font.name.clone(),
        size: size * m.vertical_scale(),
        color: state.fill,
        flags: font.style_flags(rise),
        bbox: PdfBox::new(min_x, max_y, max_x, min_y),
        transform: [m.a, m.b, m.c, m.d],
    }
}

/// Group runs into lines by baseline, then split lines at wide gaps.
pub fn group_runs_into_lines(runs: Vec<TextRun>, options: &ContentOptions) -> Vec<TextLine> {
    if runs.is_empty() {
        return vec![];
    }

    // Sort by baseline (descending, since PDF y is bottom-up) then x
    let mut runs = runs;
    runs.sort_by(|a, b| {
        baseline(b)
            .total_cmp(&baseline(a))
            .then(a.bbox.min_x().total_cmp(&b.bbox.min_x()))
    });

    let mut rows: Vec<Vec<TextRun>> = Vec::new();
    let mut current: Vec<TextRun> = Vec::new();
    let mut current_y: Option<f64> = None;

    for run in runs {
        let tolerance = run.size * options.line_tolerance;
        match current_y {
            Some(y) if (baseline(&run) - y).abs() <= tolerance => current.push(run),
            _ => {
                if !current.is_empty() {
                    rows.push(std::mem::take(&mut current));
                }
                current_y = Some(baseline(&run));
                current.push(run);
            }
        }
    }
    if !current.is_empty() {
        rows.push(current);
    }

    let mut lines = Vec::new();
    for mut row in rows {
        row.sort_by(|a, b| a.bbox.min_x().total_cmp(&b.bbox.min_x()));
        let mut segment: Vec<TextRun> = Vec::new();
        for run in row {
            if let Some(prev) = segment.last() {
                let gap = run.bbox.min_x() - prev.bbox.max_x();
                if gap > options.gap_factor * prev.size.max(run.size) {
                    lines.push(TextLine::from_runs(std::mem::take(&mut segment)));
                }
            }
            segment.push(run);
        }
        if !segment.is_empty() {
            lines.push(TextLine::from_runs(segment));
        }
    }
    lines
}

fn baseline(run: &TextRun) -> f64 {
    run.bbox.min_y() + 0.2 * run.size
}

fn fill_color(operands: &[Object]) -> Option<u32> {
    let n: Vec<f64> = operands
        .iter()
        .filter_map(get_number)
        .map(|v| v.clamp(0.0, 1.0))
        .collect();
    let (r, g, b) = match n.as_slice() {
        [gray] => (*gray, *gray, *gray),
        [r, g, b] => (*r, *g, *b),
        [c, m, y, k] => ((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k)),
        _ => return None,
    };
    let channel = |v: f64| (v * 255.0).round() as u32;
    Some(channel(r) << 16 | channel(g) << 8 | channel(b))
}

fn set_number(operands: &[Object], target: &mut f64) {
    if let Some(v) = operands.first().and_then(get_number) {
        *target = v;
    }
}

/// Helper to extract number from PDF object.
pub(crate) fn get_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn strip_subset_prefix(name: &str) -> String {
    match name.split_once('+') {
        Some((prefix, rest))
            if prefix.len() == 6 && prefix.chars().all(|c| c.is_ascii_uppercase()) =>
        {
            rest.to_string()
        }
        _ => name.to_string(),
    }
}

/// Check if character is from a script that doesn't use word spaces.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}

/// Simple text decoding fallback when no encoding is available.
fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StyleVariant;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};

    fn single_page_doc(operations: Vec<Operation>, rotate: Option<i64>) -> LopdfDocument {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "ABCDEF+Helvetica-Bold",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id, "F2" => bold_id },
        });
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if let Some(r) = rotate {
            page.set("Rotate", r);
        }
        let page_id = doc.add_object(page);
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 600.into(), 800.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn text_at(font: &str, size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]
    }

    #[test]
    fn test_matrix_then() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translation(10.0, 20.0);
        assert_eq!(scale.then(&shift).apply(1.0, 1.0), (12.0, 22.0));
        assert_eq!(shift.then(&scale).apply(1.0, 1.0), (22.0, 42.0));
    }

    #[test]
    fn test_extract_runs_with_style() {
        let mut ops = vec![Operation::new(
            "rg",
            vec![1.into(), 0.into(), 0.into()],
        )];
        ops.extend(text_at("F2", 10, 72, 700, "Total"));
        let doc = single_page_doc(ops, None);
        let parser = ContentParser::new(&doc);
        let runs = parser.extract_page_runs(1).unwrap();

        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.text, "Total");
        assert_eq!(run.font, "Helvetica-Bold");
        assert_eq!(run.size, 10.0);
        assert_eq!(run.color, 0xff0000);
        assert_eq!(run.variant(), StyleVariant::Bold);
        // 5 glyphs at the 500/1000 fallback width
        assert!((run.bbox.x1 - 72.0).abs() < 1e-9);
        assert!((run.bbox.x2 - 97.0).abs() < 1e-9);
        assert!((run.bbox.y1 - 708.0).abs() < 1e-9);
        assert!((run.bbox.y2 - 698.0).abs() < 1e-9);
    }

    #[test]
    fn test_ctm_and_rise() {
        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), 100.into(), 0.into()],
            ),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 8.into()]),
            Operation::new("Ts", vec![3.into()]),
            Operation::new("Td", vec![0.into(), 500.into()]),
            Operation::new("Tj", vec![Object::string_literal("1")]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ];
        let doc = single_page_doc(ops, None);
        let runs = ContentParser::new(&doc).extract_page_runs(1).unwrap();
        assert_eq!(runs.len(), 1);
        assert!((runs[0].bbox.x1 - 100.0).abs() < 1e-9);
        assert_eq!(runs[0].variant(), StyleVariant::Superscripted);
        assert!(runs[0].flags.contains(StyleFlags::SUPERSCRIPT));
    }

    #[test]
    fn test_load_page_groups_lines() {
        let mut ops = text_at("F1", 10, 72, 700, "Name");
        ops.extend(text_at("F1", 10, 300, 700, "Age"));
        ops.extend(text_at("F1", 10, 72, 680, "Alice"));
        let doc = single_page_doc(ops, None);
        let page = ContentParser::new(&doc).load_page(1, 4).unwrap();

        assert_eq!(page.number, 4);
        assert_eq!((page.width, page.height), (600.0, 800.0));
        // "Name" and "Age" are far apart, so they form separate lines
        let texts: Vec<String> = page.lines.iter().map(|l| l.text()).collect();
        assert_eq!(texts, vec!["Name", "Age", "Alice"]);
    }

    #[test]
    fn test_display_transform_rotate_90() {
        // Text running up the page, displayed with /Rotate 90
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new(
                "Tm",
                vec![0.into(), 1.into(), (-1).into(), 0.into(), 100.into(), 50.into()],
            ),
            Operation::new("Tj", vec![Object::string_literal("Up")]),
            Operation::new("ET", vec![]),
        ];
        let doc = single_page_doc(ops, Some(90));
        let page = ContentParser::new(&doc).load_page(1, 1).unwrap();

        assert_eq!((page.width, page.height), (800.0, 600.0));
        let run = page.runs().next().unwrap();
        assert!(run.is_horizontal());
        assert!((run.transform[0] - 1.0).abs() < 1e-9);
        assert!((run.bbox.min_x() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_fill_color() {
        assert_eq!(fill_color(&[Object::Real(0.0)]), Some(0x000000));
        assert_eq!(fill_color(&[1.into(), 1.into(), 1.into()]), Some(0xffffff));
        assert_eq!(
            fill_color(&[0.into(), 0.into(), 0.into(), 1.into()]),
            Some(0x000000)
        );
        assert_eq!(fill_color(&[]), None);
    }

    #[test]
    fn test_strip_subset_prefix() {
        assert_eq!(strip_subset_prefix("ABCDEF+Arial"), "Arial");
        assert_eq!(strip_subset_prefix("Arial+Bold"), "Arial+Bold");
    }

    #[test]
    fn test_font_name_flags() {
        let font = FontInfo {
            name: "Courier-Oblique".to_string(),
            ..FontInfo::default()
        };
        let flags = font.style_flags(0.0);
        assert!(flags.contains(StyleFlags::MONOSPACED));
        assert!(flags.contains(StyleFlags::ITALIC));
        assert!(!flags.contains(StyleFlags::BOLD));
    }
}
