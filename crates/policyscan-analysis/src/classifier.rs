//! Classifier trait and the pattern-based multi-label classifier
//!
//! Every category is evaluated independently against a segment: the weights
//! of all hitting patterns are summed and saturated into a confidence in
//! [0, 1). A category yields a finding when at least one pattern hit, the
//! confidence exceeds the acceptance threshold, and none of the category's
//! own suppressors hit. Categories never suppress each other.

use crate::registry::PatternRegistry;
use policyscan_core::{Category, Error, Finding, Result, Segment};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Trait for all segment classifiers
pub trait Classifier: Send + Sync {
    /// Classify one segment into zero or more findings
    fn classify(&self, segment: &Segment) -> Result<Vec<Finding>>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// A finding's confidence must exceed this, in [0, 1); at least one hit is always required
    #[serde(default)]
    pub acceptance_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.0,
        }
    }
}

/// Saturating confidence: grows with total weight, never reaches 1
pub fn saturate(weight: f32) -> f32 {
    if weight <= 0.0 || !weight.is_finite() {
        return 0.0;
    }
    weight / (1.0 + weight)
}

/// Evaluation of one category against one segment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryScore {
    /// Sum of the weights of all hitting patterns
    pub weight: f32,

    /// Saturated score
    pub confidence: f32,

    /// Ids of the hitting patterns
    pub matched_patterns: BTreeSet<String>,

    /// Labels of the hitting patterns
    pub labels: BTreeSet<String>,

    /// A suppressor of this category hit the segment
    pub suppressed: bool,
}

/// Classifier driven by the pattern registry
pub struct PatternClassifier {
    registry: Arc<PatternRegistry>,
    config: ClassifierConfig,
}

impl PatternClassifier {
    /// Create a new pattern classifier
    pub fn new(registry: Arc<PatternRegistry>, config: ClassifierConfig) -> Result<Self> {
        if !(0.0..1.0).contains(&config.acceptance_threshold) {
            return Err(Error::config(format!(
                "acceptance_threshold must be in [0, 1), got {}",
                config.acceptance_threshold
            )));
        }
        Ok(Self { registry, config })
    }

    /// The registry this classifier reads
    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    /// Score a text against one category
    pub fn score(&self, text: &str, category: Category) -> CategoryScore {
        let patterns = self.registry.category(category);
        let mut score = CategoryScore {
            suppressed: patterns.is_suppressed(text),
            ..Default::default()
        };

        for pattern in patterns.patterns().iter().filter(|p| p.matches(text)) {
            score.weight += pattern.weight;
            score.matched_patterns.insert(pattern.id.clone());
            if let Some(label) = &pattern.label {
                score.labels.insert(label.clone());
            }
        }
        score.confidence = saturate(score.weight);

        score
    }

    fn accepts(&self, score: &CategoryScore) -> bool {
        !score.suppressed
            && !score.matched_patterns.is_empty()
            && score.confidence > self.config.acceptance_threshold
    }
}

impl Classifier for PatternClassifier {
    fn classify(&self, segment: &Segment) -> Result<Vec<Finding>> {
        let findings = Category::ALL
            .into_iter()
            .filter_map(|category| {
                let score = self.score(&segment.text, category);
                self.accepts(&score).then(|| Finding {
                    segment_id: segment.id,
                    category,
                    confidence: score.confidence,
                    matched_patterns: score.matched_patterns,
                    labels: score.labels,
                })
            })
            .collect();

        Ok(findings)
    }

    fn name(&self) -> &str {
        "pattern"
    }
}
