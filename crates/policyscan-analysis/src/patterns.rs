//! Compiled pattern matchers
//!
//! Keyword sets are compiled into a single Aho-Corasick automaton per
//! pattern; regexes are compiled case-insensitively. Both report whether they
//! hit anywhere in a segment and where.

use crate::config::MatcherSpec;
use aho_corasick::AhoCorasick;
use policyscan_core::{Category, Error, Result};
use regex::{Regex, RegexBuilder};

/// Suffixes a phrase may carry and still count as a whole-word hit
const PLURAL_SUFFIXES: &[&str] = &["s", "es"];

/// A compiled matcher
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Case-insensitive, word-boundary aware phrase set
    Keywords(KeywordMatcher),

    /// Case-insensitive regular expression
    Regex(Regex),
}

impl Matcher {
    /// Compile a matcher spec; `id` is only used for error reporting
    pub fn compile(id: &str, spec: &MatcherSpec) -> Result<Self> {
        Self::build(id, spec, true)
    }

    /// Like [`Matcher::compile`], but keywords must end on a word boundary
    pub fn compile_exact(id: &str, spec: &MatcherSpec) -> Result<Self> {
        Self::build(id, spec, false)
    }

    fn build(id: &str, spec: &MatcherSpec, allow_plural: bool) -> Result<Self> {
        match (&spec.keywords, &spec.regex) {
            (Some(keywords), None) => {
                let matcher = KeywordMatcher::new(id, keywords)?;
                Ok(Self::Keywords(if allow_plural { matcher } else { matcher.exact() }))
            }
            (None, Some(pattern)) => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| Error::pattern(id, e.to_string()))?;
                Ok(Self::Regex(regex))
            }
            (Some(_), Some(_)) => Err(Error::pattern(id, "both `keywords` and `regex` given")),
            (None, None) => Err(Error::pattern(id, "one of `keywords` or `regex` is required")),
        }
    }

    /// True if the matcher hits anywhere in `text`
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Keywords(keywords) => keywords.is_match(text),
            Self::Regex(regex) => regex.is_match(text),
        }
    }

    /// Byte spans of all hits in `text`
    pub fn find_spans(&self, text: &str) -> Vec<(usize, usize)> {
        match self {
            Self::Keywords(keywords) => keywords.find_spans(text),
            Self::Regex(regex) => regex.find_iter(text).map(|m| (m.start(), m.end())).collect(),
        }
    }
}

/// Phrase matcher built on Aho-Corasick
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    automaton: AhoCorasick,
    phrases: Vec<String>,
    allow_plural: bool,
}

impl KeywordMatcher {
    /// Build a matcher over the given phrases
    pub fn new(id: &str, phrases: &[String]) -> Result<Self> {
        if phrases.is_empty() {
            return Err(Error::pattern(id, "keyword list is empty"));
        }

        let phrases: Vec<String> = phrases.iter().map(|p| p.trim().to_lowercase()).collect();
        if phrases.iter().any(String::is_empty) {
            return Err(Error::pattern(id, "keyword list contains an empty keyword"));
        }

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&phrases)
            .map_err(|e| Error::pattern(id, format!("Failed to build keyword matcher: {}", e)))?;

        Ok(Self {
            automaton,
            phrases,
            allow_plural: true,
        })
    }

    /// Stop accepting plural suffixes after a phrase
    pub fn exact(mut self) -> Self {
        self.allow_plural = false;
        self
    }

    /// Phrases as compiled (trimmed, lowercased)
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// True if any phrase hits as a whole word
    pub fn is_match(&self, text: &str) -> bool {
        self.automaton
            .find_overlapping_iter(text)
            .any(|m| self.on_word_boundaries(text, m.start(), m.end()))
    }

    /// Spans of whole-word phrase hits, in text order
    pub fn find_spans(&self, text: &str) -> Vec<(usize, usize)> {
        self.automaton
            .find_overlapping_iter(text)
            .filter(|m| self.on_word_boundaries(text, m.start(), m.end()))
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    /// A hit must start on a word boundary and end on one, or at a plural
    /// suffix when those are allowed
    fn on_word_boundaries(&self, text: &str, start: usize, end: usize) -> bool {
        let matched = &text[start..end];

        let starts_word = matched.chars().next().map_or(false, is_word_char);
        if starts_word && text[..start].chars().next_back().map_or(false, is_word_char) {
            return false;
        }

        let ends_word = matched.chars().next_back().map_or(false, is_word_char);
        if !ends_word {
            return true;
        }
        let rest = &text[end..];
        let tail_len = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
        let tail = &rest[..tail_len];
        tail.is_empty()
            || (self.allow_plural && PLURAL_SUFFIXES.iter().any(|s| tail.eq_ignore_ascii_case(s)))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// A weighted pattern belonging to one category
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Unique pattern identifier
    pub id: String,

    /// Category this pattern contributes to
    pub category: Category,

    /// Positive weight added to the category score on a hit
    pub weight: f32,

    /// Optional sub-category label
    pub label: Option<String>,

    matcher: Matcher,
}

impl Pattern {
    /// Create a pattern from a compiled matcher
    pub fn new(
        id: impl Into<String>,
        category: Category,
        matcher: Matcher,
        weight: f32,
        label: Option<String>,
    ) -> Result<Self> {
        let id = id.into();
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::pattern(
                id,
                format!("weight must be a positive number, got {}", weight),
            ));
        }
        Ok(Self {
            id,
            category,
            weight,
            label,
            matcher,
        })
    }

    /// True if the pattern hits anywhere in `text`
    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    /// The compiled matcher
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}
