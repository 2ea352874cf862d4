//! End-to-end analysis pipeline
//!
//! Normalizer -> Segmenter -> Classifier -> Aggregator. Every stage is
//! synchronous and pure given the registry, so one [`PolicyAnalyzer`] can be
//! shared across threads and requests.

use crate::aggregator::{Aggregator, AnalysisReport};
use crate::classifier::{Classifier, PatternClassifier};
use crate::config::AnalysisConfig;
use crate::normalizer::Normalizer;
use crate::registry::PatternRegistry;
use crate::segmenter::Segmenter;
use policyscan_core::{Error, Finding, RawDocumentText, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Counters collected while analyzing one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    /// Pages handed to the pipeline
    pub pages: usize,

    /// Pages that normalized to nothing
    pub empty_pages: usize,

    /// Segments produced
    pub segments: usize,

    /// Findings before deduplication
    pub findings: usize,

    /// Wall time spent in the pipeline
    pub latency_us: u64,
}

/// Report plus the counters of the run that produced it
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub report: AnalysisReport,
    pub stats: AnalysisStats,
}

/// The assembled pipeline
pub struct PolicyAnalyzer {
    normalizer: Normalizer,
    segmenter: Segmenter,
    classifier: Arc<dyn Classifier>,
    aggregator: Aggregator,
}

impl PolicyAnalyzer {
    /// Build a pipeline around the pattern classifier
    pub fn new(registry: Arc<PatternRegistry>, config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let classifier = PatternClassifier::new(registry, config.classifier.clone())?;
        Self::with_classifier(Arc::new(classifier), config)
    }

    /// Build a pipeline around any classifier
    pub fn with_classifier(classifier: Arc<dyn Classifier>, config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            normalizer: Normalizer::new(config.normalizer.clone()),
            segmenter: Segmenter::new(config.segmenter.clone())?,
            classifier,
            aggregator: Aggregator::new(config.aggregator.clone()),
        })
    }

    /// Name of the classifier in use
    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Analyze a document and return the report
    pub fn analyze(&self, document: &RawDocumentText) -> Result<AnalysisReport> {
        Ok(self.run(document)?.report)
    }

    /// Analyze a document and return the report with run counters
    ///
    /// A document without text yields an empty report, not an error.
    pub fn run(&self, document: &RawDocumentText) -> Result<AnalysisRun> {
        let start = Instant::now();

        let normalized = self.normalizer.normalize(document);
        let segments = self.segmenter.segment(&normalized);

        let mut findings: Vec<Finding> = Vec::new();
        for segment in &segments {
            let mut hits = self.classifier.classify(segment).map_err(|e| {
                Error::pipeline(format!(
                    "classifier '{}' failed on segment {}: {}",
                    self.classifier.name(),
                    segment.id,
                    e
                ))
            })?;
            findings.append(&mut hits);
        }

        let report = self.aggregator.aggregate(&segments, &findings)?;

        let stats = AnalysisStats {
            pages: document.page_count(),
            empty_pages: normalized.pages().iter().filter(|p| p.is_empty()).count(),
            segments: segments.len(),
            findings: findings.len(),
            latency_us: start.elapsed().as_micros() as u64,
        };

        debug!(
            pages = stats.pages,
            segments = stats.segments,
            findings = stats.findings,
            reported = report.total(),
            latency_us = stats.latency_us,
            "Analysis complete"
        );

        Ok(AnalysisRun { report, stats })
    }
}
