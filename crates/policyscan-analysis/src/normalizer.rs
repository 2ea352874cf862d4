//! Text normalization for extracted page text
//!
//! Cleans raw extraction output page by page:
//! - collapses whitespace runs, keeping paragraph breaks as `"\n\n"`
//! - rejoins words split by end-of-line hyphenation
//! - strips control characters, form feeds and zero-width marks
//! - corrects common OCR artifacts (ligatures, typographic quotes and dashes)
//!
//! Every byte of the normalized text keeps a back-reference to the byte range
//! of the original page text it came from, so later spans can be traced back.

use policyscan_core::RawDocumentText;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Normalizer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Rejoin words split across lines by a trailing hyphen
    #[serde(default = "default_true")]
    pub repair_hyphenation: bool,

    /// Replace ligatures, typographic quotes and dashes with plain ASCII
    #[serde(default = "default_true")]
    pub fix_ocr_artifacts: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            repair_hyphenation: true,
            fix_ocr_artifacts: true,
        }
    }
}

/// One normalized page together with its offset map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPage {
    /// Page index in the source document
    pub page: usize,

    /// Normalized text
    pub text: String,

    /// For every byte of `text`, the original byte range that produced it
    origin: Vec<(usize, usize)>,
}

impl NormalizedPage {
    /// True when the page carries no text after normalization
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Map a normalized byte range back to the original page text
    pub fn source_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if start >= end || end > self.origin.len() {
            return None;
        }
        Some((self.origin[start].0, self.origin[end - 1].1))
    }
}

/// Normalized text of a whole document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    pages: Vec<NormalizedPage>,
}

impl NormalizedText {
    /// Pages in reading order, including empty ones
    pub fn pages(&self) -> &[NormalizedPage] {
        &self.pages
    }

    /// True when every page normalized to nothing
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(NormalizedPage::is_empty)
    }
}

/// A cleaned character and the original range it stands for
#[derive(Debug, Clone, Copy)]
struct Unit {
    ch: char,
    start: usize,
    end: usize,
}

/// Pure page-by-page text normalizer
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Create a normalizer with the given settings
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalize every page of a document
    pub fn normalize(&self, document: &RawDocumentText) -> NormalizedText {
        let pages: Vec<NormalizedPage> = document
            .pages()
            .iter()
            .map(|page| self.normalize_page(page.index, &page.text))
            .collect();

        let empty = pages.iter().filter(|p| p.is_empty()).count();
        if empty > 0 {
            debug!("{} of {} pages normalized to empty text", empty, pages.len());
        }

        NormalizedText { pages }
    }

    /// Normalize a single page of raw text
    pub fn normalize_page(&self, page: usize, raw: &str) -> NormalizedPage {
        let units = self.clean(raw);

        let mut text = String::with_capacity(raw.len());
        let mut origin = Vec::with_capacity(raw.len());
        let mut push = |text: &mut String, ch: char, span: (usize, usize)| {
            text.push(ch);
            origin.extend(std::iter::repeat(span).take(ch.len_utf8()));
        };

        let mut i = 0;
        while i < units.len() {
            let unit = units[i];

            if unit.ch == '-' && self.config.repair_hyphenation {
                if let Some(next) = hyphen_join(&units, i) {
                    i = next;
                    continue;
                }
            }

            if unit.ch.is_whitespace() {
                let run_start = i;
                let mut breaks = 0;
                while i < units.len() && units[i].ch.is_whitespace() {
                    if units[i].ch == '\n' {
                        breaks += 1;
                    }
                    i += 1;
                }
                // leading and trailing runs vanish
                if text.is_empty() || i == units.len() {
                    continue;
                }
                let span = (units[run_start].start, units[i - 1].end);
                if breaks >= 2 {
                    push(&mut text, '\n', span);
                    push(&mut text, '\n', span);
                } else {
                    push(&mut text, ' ', span);
                }
                continue;
            }

            push(&mut text, unit.ch, (unit.start, unit.end));
            i += 1;
        }

        NormalizedPage { page, text, origin }
    }

    /// Drop or replace characters one by one, keeping their original ranges
    fn clean(&self, raw: &str) -> Vec<Unit> {
        let mut units = Vec::with_capacity(raw.len());
        let mut chars = raw.char_indices().peekable();

        while let Some((start, ch)) = chars.next() {
            let end = start + ch.len_utf8();
            let mut emit = |c: char| units.push(Unit { ch: c, start, end });

            if self.config.fix_ocr_artifacts {
                if let Some(replacement) = artifact_replacement(ch) {
                    replacement.chars().for_each(&mut emit);
                    continue;
                }
            }

            match ch {
                '\r' => {
                    if !matches!(chars.peek(), Some((_, '\n'))) {
                        emit('\n');
                    }
                }
                '\n' => emit('\n'),
                // page breaks
                '\u{000C}' | '\u{2028}' | '\u{2029}' => emit(' '),
                '\u{00AD}' | '\u{FFFD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => {}
                c if c.is_whitespace() => emit(' '),
                c if c.is_control() => {}
                c => emit(c),
            }
        }

        units
    }
}

/// If the hyphen at `i` ends a line inside a word, return the index to resume at
fn hyphen_join(units: &[Unit], i: usize) -> Option<usize> {
    if i == 0 || !units[i - 1].ch.is_alphabetic() {
        return None;
    }

    let mut j = i + 1;
    while j < units.len() && units[j].ch == ' ' {
        j += 1;
    }
    if units.get(j)?.ch != '\n' {
        return None;
    }
    j += 1;
    while j < units.len() && units[j].ch == ' ' {
        j += 1;
    }

    units.get(j).filter(|u| u.ch.is_lowercase()).map(|_| j)
}

fn artifact_replacement(c: char) -> Option<&'static str> {
    let replacement = match c {
        '\u{FB00}' => "ff",
        '\u{FB01}' => "fi",
        '\u{FB02}' => "fl",
        '\u{FB03}' => "ffi",
        '\u{FB04}' => "ffl",
        '\u{FB05}' | '\u{FB06}' => "st",
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => "\"",
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => "-",
        '\u{2026}' => "...",
        _ => return None,
    };
    Some(replacement)
}

fn default_true() -> bool {
    true
}
