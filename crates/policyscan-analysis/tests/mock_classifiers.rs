//! Mock classifiers for testing
//!
//! Provides configurable mock implementations of the Classifier trait
//! for testing the pipeline, aggregation, and error handling independent
//! of any pattern set.

use policyscan_analysis::{AnalysisConfig, Classifier, PolicyAnalyzer};
use policyscan_core::{Category, Error, Finding, RawDocumentText, Result, Segment};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A configurable mock classifier for testing
pub struct MockClassifier {
    name: String,
    category: Category,
    confidence: f32,
    call_count: AtomicU32,
}

impl MockClassifier {
    /// Create a new mock classifier that flags every segment as a loophole
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            category: Category::Loophole,
            confidence: 0.5,
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the category this classifier will report
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the confidence this classifier will report
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Get the number of times classify was called
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, segment: &Segment) -> Result<Vec<Finding>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        // Dynamic behaviour based on text content (for testing)
        if segment.text.contains("IGNORE") {
            return Ok(Vec::new());
        }

        Ok(vec![Finding {
            segment_id: segment.id,
            category: self.category,
            confidence: self.confidence,
            matched_patterns: BTreeSet::from([self.name.clone()]),
            labels: BTreeSet::new(),
        }])
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A classifier that always fails - for testing error paths
pub struct FailingClassifier {
    name: String,
    error_message: String,
}

impl FailingClassifier {
    pub fn new(name: &str, error_message: &str) -> Self {
        Self {
            name: name.to_string(),
            error_message: error_message.to_string(),
        }
    }
}

impl Classifier for FailingClassifier {
    fn classify(&self, _segment: &Segment) -> Result<Vec<Finding>> {
        Err(Error::pipeline(self.error_message.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A classifier that reports a segment id the pipeline never produced
pub struct StrayClassifier;

impl Classifier for StrayClassifier {
    fn classify(&self, segment: &Segment) -> Result<Vec<Finding>> {
        Ok(vec![Finding {
            segment_id: segment.id + 1000,
            category: Category::Benefit,
            confidence: 0.5,
            matched_patterns: BTreeSet::new(),
            labels: BTreeSet::new(),
        }])
    }

    fn name(&self) -> &str {
        "stray"
    }
}

fn document() -> RawDocumentText {
    RawDocumentText::from_pages([
        "Room rent is limited to one percent of the sum insured. \
         Ambulance charges are covered up to a fixed limit.",
        "Room rent is limited to one percent of the sum insured. \
         IGNORE this sentence in every classifier.",
    ])
}

#[test]
fn test_mock_classifier_called_once_per_segment() {
    let mock = Arc::new(MockClassifier::new("mock"));
    let analyzer = PolicyAnalyzer::with_classifier(mock.clone(), &AnalysisConfig::default()).unwrap();

    let run = analyzer.run(&document()).unwrap();

    assert_eq!(run.stats.segments, 4);
    assert_eq!(mock.call_count(), 4);
    assert_eq!(run.stats.findings, 3);

    // the repeated room rent sentence is reported once
    assert_eq!(run.report.loopholes().len(), 2);
    assert_eq!(analyzer.classifier_name(), "mock");
}

#[test]
fn test_mock_category_routing() {
    let mock = MockClassifier::new("highlights")
        .with_category(Category::CoverageHighlight)
        .with_confidence(0.8);
    let analyzer =
        PolicyAnalyzer::with_classifier(Arc::new(mock), &AnalysisConfig::default()).unwrap();

    let report = analyzer.analyze(&document()).unwrap();

    assert!(report.loopholes().is_empty());
    assert_eq!(report.coverage_highlights().len(), 2);
    assert_eq!(report.coverage_highlights()[0].page, 0);
    assert_eq!(report.coverage_highlights()[0].confidence, 0.8);
    assert_eq!(report.coverage_highlights()[0].patterns, vec!["highlights"]);
}

#[test]
fn test_failing_classifier_aborts_run() {
    let failing = FailingClassifier::new("failing", "model unavailable");
    let analyzer =
        PolicyAnalyzer::with_classifier(Arc::new(failing), &AnalysisConfig::default()).unwrap();

    let err = analyzer.analyze(&document()).unwrap_err();
    assert!(matches!(err, Error::Pipeline(_)));
    assert!(err.to_string().contains("model unavailable"));
}

#[test]
fn test_unknown_segment_is_pipeline_error() {
    let analyzer =
        PolicyAnalyzer::with_classifier(Arc::new(StrayClassifier), &AnalysisConfig::default())
            .unwrap();

    let err = analyzer.analyze(&document()).unwrap_err();
    assert!(matches!(err, Error::Pipeline(_)));
}

#[test]
fn test_failing_classifier_not_called_on_empty_document() {
    let failing = FailingClassifier::new("failing", "should not run");
    let analyzer =
        PolicyAnalyzer::with_classifier(Arc::new(failing), &AnalysisConfig::default()).unwrap();

    let report = analyzer
        .analyze(&RawDocumentText::from_pages(["   "]))
        .unwrap();
    assert!(report.is_empty());
}
