//! PolicyScan Analysis
//!
//! Turns the extracted text of an insurance policy into a categorized report
//! of loopholes, benefits, major exclusions and coverage highlights.
//!
//! The pipeline is fully deterministic and runs in four stages:
//! - Normalizer: cleans raw page text and keeps an offset map back to it
//! - Segmenter: splits pages into sentence and clause units
//! - Classifier: scores every unit against a versioned pattern registry
//! - Aggregator: deduplicates findings and builds the report
//!
//! Pattern sets are plain YAML. A built-in set ships with the crate; see
//! [`registry::BUILTIN_PATTERNS`].

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod normalizer;
pub mod patterns;
pub mod pipeline;
pub mod registry;
pub mod segmenter;

pub use aggregator::{Aggregator, AggregatorConfig, AnalysisReport, ReportEntry};
pub use classifier::{saturate, CategoryScore, Classifier, ClassifierConfig, PatternClassifier};
pub use config::{AnalysisConfig, CategorySpec, MatcherSpec, PatternSetSpec, PatternSpec};
pub use normalizer::{NormalizedPage, NormalizedText, Normalizer, NormalizerConfig};
pub use patterns::{KeywordMatcher, Matcher, Pattern};
pub use pipeline::{AnalysisRun, AnalysisStats, PolicyAnalyzer};
pub use registry::{CategoryPatterns, PatternRegistry};
pub use segmenter::{Segmenter, SegmenterConfig};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aggregator::AnalysisReport;
    pub use crate::classifier::{Classifier, PatternClassifier};
    pub use crate::config::AnalysisConfig;
    pub use crate::pipeline::PolicyAnalyzer;
    pub use crate::registry::PatternRegistry;
    pub use policyscan_core::prelude::*;
}
