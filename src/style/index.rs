//! Per-page style index keyed by normalized line text.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::{Page, SpanStyle, TextLine};

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Collapse whitespace runs to single spaces, trim, and NFC-normalize.
pub(crate) fn collapse(text: &str) -> String {
    whitespace_runs()
        .replace_all(text, " ")
        .trim()
        .nfc()
        .collect()
}

/// Identifier of a line: its span texts joined by single spaces.
///
/// Empty spans are skipped, `" . "` is tightened to `". "` and whitespace
/// is collapsed.
pub fn normalize_identifier(line: &TextLine) -> String {
    let joined = line
        .runs
        .iter()
        .map(|r| r.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    collapse(&joined.replace(" . ", ". "))
}

/// Styles of the spans on one line, keyed by raw span text.
///
/// Keeps insertion order; re-inserting a text updates it in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineStyles {
    spans: Vec<(String, SpanStyle)>,
}

impl LineStyles {
    /// Record the style of a span.
    pub fn insert(&mut self, text: impl Into<String>, style: SpanStyle) {
        let text = text.into();
        match self.spans.iter_mut().find(|(t, _)| *t == text) {
            Some(entry) => entry.1 = style,
            None => self.spans.push((text, style)),
        }
    }

    /// Style of the span with exactly this text.
    pub fn get(&self, text: &str) -> Option<&SpanStyle> {
        self.spans.iter().find(|(t, _)| t == text).map(|(_, s)| s)
    }

    /// Iterate over `(span text, style)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SpanStyle)> {
        self.spans.iter().map(|(t, s)| (t.as_str(), s))
    }

    /// Number of spans.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Check if no span was recorded.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Line identifier to span styles, for one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleIndex {
    page: u32,
    lines: HashMap<String, LineStyles>,
    frequencies: HashMap<String, usize>,
}

impl StyleIndex {
    /// Create an empty index for a page.
    pub fn new(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    /// Page the index was built from.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Styles of the line with this identifier.
    pub fn line(&self, identifier: &str) -> Option<&LineStyles> {
        self.lines.get(identifier)
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the index has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// How many lines carried this identifier.
    pub fn frequency(&self, identifier: &str) -> usize {
        self.frequencies.get(identifier).copied().unwrap_or(0)
    }

    /// Identifiers by descending usage, ties by identifier.
    pub fn frequencies(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = self
            .frequencies
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        counts
    }

    /// Add a line. A repeated identifier replaces the earlier line's styles.
    pub fn insert_line(&mut self, line: &TextLine) {
        let identifier = normalize_identifier(line);
        let mut styles = LineStyles::default();
        for run in &line.runs {
            styles.insert(run.text.clone(), SpanStyle::from(run));
        }
        *self.frequencies.entry(identifier.clone()).or_insert(0) += 1;
        self.lines.insert(identifier, styles);
    }
}

/// Build the style index of a page.
///
/// Fails with [`Error::NoDiscriminatingFonts`] when the page has no lines.
pub fn build_style_index(page: &Page) -> Result<StyleIndex> {
    let mut index = StyleIndex::new(page.number);
    for line in page.lines.iter().filter(|l| !l.runs.is_empty()) {
        index.insert_line(line);
    }

    if index.is_empty() {
        return Err(Error::NoDiscriminatingFonts { page: page.number });
    }
    log::debug!(
        "Page {}: style index with {} identifiers",
        page.number,
        index.len()
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PdfBox;
    use crate::model::{StyleVariant, TextRun};

    fn run(text: &str, x: f64, size: f64) -> TextRun {
        TextRun::new(text, PdfBox::new(x, 710.0, x + 40.0, 700.0), size)
    }

    #[test]
    fn test_normalize_identifier() {
        let line = TextLine::from_runs(vec![
            run("Fig", 10.0, 10.0),
            run(" . ", 50.0, 10.0),
            run("", 60.0, 10.0),
            run("2  ", 90.0, 10.0),
        ]);
        assert_eq!(normalize_identifier(&line), "Fig. 2");

        let line = TextLine::from_runs(vec![run("Total  Sales\tQ1", 10.0, 10.0)]);
        assert_eq!(normalize_identifier(&line), "Total Sales Q1");
    }

    #[test]
    fn test_identifier_dot_tightening() {
        let line = TextLine::from_runs(vec![run("1 . Introduction", 10.0, 10.0)]);
        assert_eq!(normalize_identifier(&line), "1. Introduction");
    }

    #[test]
    fn test_identifier_is_nfc() {
        let line = TextLine::from_runs(vec![run("Cafe\u{301}", 10.0, 10.0)]);
        assert_eq!(normalize_identifier(&line), "Caf\u{e9}");
    }

    #[test]
    fn test_build_style_index() {
        let page = Page::new(
            3,
            612.0,
            792.0,
            0,
            vec![
                TextLine::from_runs(vec![
                    run("Revenue", 10.0, 14.0).with_flags(20),
                    run("2023", 80.0, 10.0).with_color(0x112233),
                ]),
                TextLine::from_runs(vec![run("Revenue 2023", 10.0, 9.0)]),
                TextLine::from_runs(vec![run("Notes", 10.0, 8.0)]),
            ],
        );
        let index = build_style_index(&page).unwrap();
        assert_eq!(index.page(), 3);
        assert_eq!(index.len(), 2);
        assert_eq!(index.frequency("Revenue 2023"), 2);
        assert_eq!(index.frequencies()[0], ("Revenue 2023", 2));

        // The later line replaced the earlier one
        let line = index.line("Revenue 2023").unwrap();
        assert_eq!(line.len(), 1);
        assert_eq!(line.get("Revenue 2023").unwrap().size, 9.0);
        assert!(line.get("Revenue").is_none());
    }

    #[test]
    fn test_span_styles_recorded() {
        let page = Page::new(
            1,
            612.0,
            792.0,
            0,
            vec![TextLine::from_runs(vec![
                run("Revenue", 10.0, 14.0).with_flags(20),
                run("2023", 80.0, 10.0).with_color(0x112233),
            ])],
        );
        let index = build_style_index(&page).unwrap();
        let line = index.line("Revenue 2023").unwrap();
        assert_eq!(line.get("Revenue").unwrap().variant, StyleVariant::Bold);
        assert_eq!(line.get("2023").unwrap().color_hex(), "112233");
        let order: Vec<&str> = line.iter().map(|(t, _)| t).collect();
        assert_eq!(order, ["Revenue", "2023"]);
    }

    #[test]
    fn test_empty_page_fails() {
        let err = build_style_index(&Page::letter(5)).unwrap_err();
        assert!(matches!(err, Error::NoDiscriminatingFonts { page: 5 }));
        assert_eq!(err.to_string(), "Zero discriminating fonts found on page 5");
    }
}
