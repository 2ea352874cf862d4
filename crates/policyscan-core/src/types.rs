//! Core types for PolicyScan

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Text of a single page as produced by the extraction collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// Zero-based page index within the document
    pub index: usize,

    /// Raw extracted text, possibly containing layout noise
    pub text: String,
}

impl PageText {
    /// Create a new page
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Ordered page texts of one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocumentText {
    pages: Vec<PageText>,
}

impl RawDocumentText {
    /// Build a document from page texts in reading order
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages
                .into_iter()
                .enumerate()
                .map(|(index, text)| PageText::new(index, text))
                .collect(),
        }
    }

    /// Pages in reading order
    pub fn pages(&self) -> &[PageText] {
        &self.pages
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// True when no page carries any non-whitespace text
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }
}

/// The four fixed classification buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[serde(alias = "loopholes")]
    Loophole,
    #[serde(alias = "benefits")]
    Benefit,
    #[serde(alias = "exclusions", alias = "major_exclusions")]
    Exclusion,
    #[serde(alias = "coverage_highlights")]
    CoverageHighlight,
}

impl Category {
    /// All categories in report order
    pub const ALL: [Category; 4] = [
        Category::Loophole,
        Category::Benefit,
        Category::Exclusion,
        Category::CoverageHighlight,
    ];

    /// Stable identifier used in configuration and finding ids
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loophole => "loophole",
            Self::Benefit => "benefit",
            Self::Exclusion => "exclusion",
            Self::CoverageHighlight => "coverage_highlight",
        }
    }

    /// Name of the report field this category lands in
    pub fn report_field(&self) -> &'static str {
        match self {
            Self::Loophole => "loopholes",
            Self::Benefit => "benefits",
            Self::Exclusion => "major_exclusions",
            Self::CoverageHighlight => "coverage_highlights",
        }
    }

    /// Position in [`Category::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Self::Loophole => 0,
            Self::Benefit => 1,
            Self::Exclusion => 2,
            Self::CoverageHighlight => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "loophole" | "loopholes" => Ok(Self::Loophole),
            "benefit" | "benefits" => Ok(Self::Benefit),
            "exclusion" | "exclusions" | "major_exclusions" => Ok(Self::Exclusion),
            "coverage_highlight" | "coverage_highlights" => Ok(Self::CoverageHighlight),
            other => Err(crate::Error::config(format!("unknown category '{}'", other))),
        }
    }
}

/// A contiguous span of normalized page text, the unit of classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Sequential id across the whole document, in reading order
    pub id: usize,

    /// Segment text
    pub text: String,

    /// Page the segment was taken from
    pub source_page: usize,

    /// Byte range in the original page text
    pub source_range: (usize, usize),
}

/// A (segment, category, confidence) judgment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Id of the segment this finding refers to
    pub segment_id: usize,

    /// Category the segment was classified into
    pub category: Category,

    /// Saturated score in [0, 1)
    pub confidence: f32,

    /// Ids of the patterns that hit
    pub matched_patterns: BTreeSet<String>,

    /// Sub-category labels of the patterns that hit
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub labels: BTreeSet<String>,
}

/// Digits of the zero-padded segment number in finding ids
pub const FINDING_ID_DIGITS: usize = 6;

impl Finding {
    /// Report key, unique per (category, segment)
    ///
    /// Keys sort in document order for documents of up to a million segments.
    pub fn id(&self) -> String {
        format!(
            "{}-{:0width$}",
            self.category.as_str(),
            self.segment_id,
            width = FINDING_ID_DIGITS
        )
    }
}
