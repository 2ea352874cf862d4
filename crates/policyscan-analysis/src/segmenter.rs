//! Sentence and clause segmentation
//!
//! Splits normalized pages into short, addressable units for pattern matching.
//! Boundaries are sentence-terminal punctuation, semicolons, paragraph breaks,
//! bullet glyphs and list-item markers such as `(a)` or `iv)`. Dangling
//! fragments shorter than the configured minimum are merged into the next
//! unit on the same page, and units without any alphabetic token are dropped.

use crate::normalizer::{NormalizedPage, NormalizedText};
use policyscan_core::{Error, Result, Segment};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Abbreviations that end in a period without ending the sentence
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "viz", "vs", "no", "nos", "rs", "sec", "cl", "approx", "max", "min",
    "incl", "excl", "art", "para", "mr", "mrs", "ms", "dr", "st", "co", "ltd", "inc",
];

const BULLETS: &[char] = &[
    '\u{2022}', '\u{25AA}', '\u{25E6}', '\u{2023}', '\u{25CF}', '\u{25A0}', '\u{27A2}',
    '\u{25BA}', '\u{2713}', '\u{2043}', '\u{F0B7}',
];

/// Segmenter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Fragments shorter than this many characters are merged forward
    #[serde(default = "default_min_segment_chars")]
    pub min_segment_chars: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_segment_chars: default_min_segment_chars(),
        }
    }
}

/// Deterministic splitter from normalized text to segments
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmenterConfig,
    list_marker: Regex,
    page_header: Regex,
}

impl Segmenter {
    /// Create a new segmenter
    pub fn new(config: SegmenterConfig) -> Result<Self> {
        Ok(Self {
            config,
            list_marker: Regex::new(r"\(?\b(?:[a-zA-Z]|[ivxIVX]{2,4}|\d{1,2})\)")
                .map_err(|e| Error::config(format!("Failed to compile list marker regex: {}", e)))?,
            page_header: Regex::new(r"(?i)^(?:page|pg\.?)\s*\d+(?:\s*(?:of|/)\s*\d+)?$")
                .map_err(|e| Error::config(format!("Failed to compile page header regex: {}", e)))?,
        })
    }

    /// Segment every page, numbering segments across the whole document
    pub fn segment(&self, text: &NormalizedText) -> Vec<Segment> {
        let mut segments = Vec::new();

        for page in text.pages() {
            let before = segments.len();
            for unit in self.page_units(page) {
                let Some(source_range) = page.source_range(unit.start, unit.end) else {
                    continue;
                };
                segments.push(Segment {
                    id: segments.len(),
                    text: unit.text,
                    source_page: page.page,
                    source_range,
                });
            }
            debug!("Page {} produced {} segments", page.page, segments.len() - before);
        }

        segments
    }

    /// Final units of one page, after noise removal and merging
    ///
    /// A merged unit keeps the separators between adjacent pieces, but a
    /// dropped noise piece between two kept pieces is replaced by a space.
    fn page_units(&self, page: &NormalizedPage) -> Vec<Unit> {
        let text = page.text.as_str();
        let mut pieces = Vec::new();
        let mut after_noise = false;
        for (s, e) in self.split(text).into_iter().filter_map(|(s, e)| trim_piece(text, s, e)) {
            if self.is_noise(&text[s..e]) {
                after_noise = true;
                continue;
            }
            pieces.push(Unit::new(text, s, e, after_noise));
            after_noise = false;
        }

        let min = self.config.min_segment_chars;
        let mut merged: Vec<Unit> = Vec::with_capacity(pieces.len());
        let mut pending: Option<Unit> = None;

        for piece in pieces {
            let unit = match pending.take() {
                Some(mut unit) => {
                    unit.append(text, piece);
                    unit
                }
                None => piece,
            };
            if unit.text.chars().count() < min {
                pending = Some(unit);
            } else {
                merged.push(unit);
            }
        }

        // a trailing fragment has nothing to merge into but its predecessor
        if let Some(unit) = pending {
            match merged.last_mut() {
                Some(last) => last.append(text, unit),
                None => merged.push(unit),
            }
        }

        merged
    }

    /// Raw pieces between separators, untrimmed
    fn split(&self, text: &str) -> Vec<(usize, usize)> {
        let mut cuts = self.separator_cuts(text);
        cuts.extend(self.list_marker_cuts(text));
        cuts.sort_unstable();

        let mut pieces = Vec::with_capacity(cuts.len() + 1);
        let mut start = 0;
        for (cut_start, cut_end) in cuts {
            if cut_start < start {
                start = start.max(cut_end);
                continue;
            }
            pieces.push((start, cut_start));
            start = cut_end;
        }
        pieces.push((start, text.len()));
        pieces
    }

    /// Excluded separator ranges; sentence ends are empty cuts after the punctuation
    fn separator_cuts(&self, text: &str) -> Vec<(usize, usize)> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut cuts = Vec::new();
        let mut k = 0;

        while k < chars.len() {
            let (pos, ch) = chars[k];
            match ch {
                '.' | '!' | '?' => {
                    let mut m = k + 1;
                    while m < chars.len()
                        && matches!(chars[m].1, '.' | '!' | '?' | '"' | '\'' | ')' | ']')
                    {
                        m += 1;
                    }
                    let at_break = chars.get(m).map_or(true, |&(_, c)| c.is_whitespace());
                    if at_break && !(ch == '.' && ends_with_abbreviation(&text[..pos])) {
                        let end = chars.get(m).map_or(text.len(), |&(p, _)| p);
                        cuts.push((end, end));
                    }
                    k = m;
                    continue;
                }
                ';' | '\n' => cuts.push((pos, pos + 1)),
                c if BULLETS.contains(&c) => cuts.push((pos, pos + c.len_utf8())),
                _ => {}
            }
            k += 1;
        }

        cuts
    }

    /// List-item markers like `(a)`, `b)`, `(iv)`, `3)` standing alone between spaces
    fn list_marker_cuts(&self, text: &str) -> Vec<(usize, usize)> {
        self.list_marker
            .find_iter(text)
            .filter(|m| {
                let before = text[..m.start()].chars().next_back();
                let after = text[m.end()..].chars().next();
                before.map_or(true, char::is_whitespace) && after.map_or(true, char::is_whitespace)
            })
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    /// Page numbers, running headers and other tokens without words
    fn is_noise(&self, piece: &str) -> bool {
        let has_word = piece
            .split_whitespace()
            .any(|token| token.chars().any(char::is_alphabetic));
        !has_word || self.page_header.is_match(piece)
    }
}

/// A segment under construction: byte span in the page plus its text
#[derive(Debug)]
struct Unit {
    start: usize,
    end: usize,
    text: String,
    after_noise: bool,
}

impl Unit {
    fn new(page: &str, start: usize, end: usize, after_noise: bool) -> Self {
        Self {
            start,
            end,
            text: page[start..end].to_string(),
            after_noise,
        }
    }

    /// Extend with a later unit of the same page
    fn append(&mut self, page: &str, next: Unit) {
        if next.after_noise {
            self.text.push(' ');
        } else {
            self.text.push_str(&collapse_whitespace(&page[self.end..next.start]));
        }
        self.text.push_str(&next.text);
        self.end = next.end;
    }
}

/// Replace each whitespace run with a single space
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Trim whitespace and leading dash/asterisk bullets; None when nothing is left
fn trim_piece(text: &str, mut start: usize, mut end: usize) -> Option<(usize, usize)> {
    let piece = &text[start..end];
    let trimmed_start = piece.trim_start_matches(|c: char| c.is_whitespace() || c == '*');
    let trimmed_start = match trimmed_start.strip_prefix("- ") {
        Some(rest) => rest.trim_start(),
        None => trimmed_start,
    };
    start += piece.len() - trimmed_start.len();
    end -= trimmed_start.len() - trimmed_start.trim_end().len();
    (start < end).then_some((start, end))
}

fn ends_with_abbreviation(before: &str) -> bool {
    let word = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(['(', '"', '\''])
        .to_lowercase();
    ABBREVIATIONS.contains(&word.as_str())
}

fn default_min_segment_chars() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::Normalizer;
    use policyscan_core::RawDocumentText;

    fn segment_pages(pages: &[&str], min: usize) -> Vec<Segment> {
        let doc = RawDocumentText::from_pages(pages.iter().copied());
        let normalized = Normalizer::default().normalize(&doc);
        Segmenter::new(SegmenterConfig {
            min_segment_chars: min,
        })
        .unwrap()
        .segment(&normalized)
    }

    fn texts(segments: &[Segment]) -> Vec<&str> {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_splits_sentences() {
        let segments = segment_pages(
            &["Hospitalization is covered. Day care is covered! Is dental covered? No."],
            0,
        );
        assert_eq!(
            texts(&segments),
            vec![
                "Hospitalization is covered.",
                "Day care is covered!",
                "Is dental covered?",
                "No."
            ]
        );
    }

    #[test]
    fn test_keeps_decimals_and_abbreviations() {
        let segments = segment_pages(
            &["A co-payment of 12.5% applies, e.g. for cataract surgery under Sec. 4 of the policy."],
            0,
        );
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_splits_clause_separators() {
        let segments = segment_pages(
            &["Covered expenses include room rent; nursing charges \u{2022} ICU charges (a) ambulance fees"],
            0,
        );
        assert_eq!(
            texts(&segments),
            vec!["Covered expenses include room rent", "nursing charges", "ICU charges", "ambulance fees"]
        );
    }

    #[test]
    fn test_inline_parenthetical_is_not_a_marker() {
        let segments = segment_pages(&["Refer to Section 4(a) for the claim procedure."], 0);
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_merges_short_fragments_forward() {
        let segments = segment_pages(
            &["Exclusions\n\nThe policy does not cover cosmetic surgery."],
            20,
        );
        assert_eq!(
            texts(&segments),
            vec!["Exclusions The policy does not cover cosmetic surgery."]
        );
    }

    #[test]
    fn test_merge_skips_dropped_page_header() {
        let raw = "Exclusions\n\nPage 3 of 10\n\nThe policy does not cover cosmetic surgery.";
        let segments = segment_pages(&[raw], 20);
        assert_eq!(
            texts(&segments),
            vec!["Exclusions The policy does not cover cosmetic surgery."]
        );
        // the source range still spans the whole merged region
        let (s, e) = segments[0].source_range;
        assert_eq!(&raw[s..e], raw);
    }

    #[test]
    fn test_merge_skips_dropped_page_number() {
        let segments = segment_pages(&["Section 4\n\n12\n\nRoom rent is capped at 1% of the sum insured."], 20);
        assert_eq!(
            texts(&segments),
            vec!["Section 4 Room rent is capped at 1% of the sum insured."]
        );
    }

    #[test]
    fn test_trailing_fragment_merges_backward() {
        let segments = segment_pages(
            &["The waiting period for hernia is two years; see table"],
            20,
        );
        assert_eq!(segments.len(), 1);
        assert_eq!(
            segments[0].text,
            "The waiting period for hernia is two years; see table"
        );
    }

    #[test]
    fn test_drops_noise() {
        let segments = segment_pages(&["Page 3 of 10\n\n12\n\nAmbulance cover is included.\n\n- 4 -"], 0);
        assert_eq!(texts(&segments), vec!["Ambulance cover is included."]);
    }

    #[test]
    fn test_never_crosses_pages_and_ids_are_sequential() {
        let segments = segment_pages(
            &["First page sentence one. First page sentence two.", "", "Third page"],
            20,
        );
        assert_eq!(segments.len(), 3);
        assert_eq!(segments.iter().map(|s| s.id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(segments[2].source_page, 2);
        assert_eq!(segments[2].text, "Third page");
    }

    #[test]
    fn test_source_range_points_into_raw_page() {
        let raw = "Intro   text here.  Claims must be\nfiled within 30 days.";
        let segments = segment_pages(&[raw], 0);
        let last = segments.last().unwrap();
        assert_eq!(last.text, "Claims must be filed within 30 days.");
        let (s, e) = last.source_range;
        assert_eq!(&raw[s..e], "Claims must be\nfiled within 30 days.");
    }

    #[test]
    fn test_deterministic() {
        let pages = ["Benefits: cashless treatment; reimbursement. (a) ambulance (b) day care."];
        assert_eq!(segment_pages(&pages, 20), segment_pages(&pages, 20));
    }
}
