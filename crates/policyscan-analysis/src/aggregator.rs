//! Report aggregation
//!
//! Routes findings into their category buckets, drops near-identical repeats
//! (boilerplate that appears on several pages) keeping the first occurrence,
//! and builds the final [`AnalysisReport`].

use policyscan_core::{Category, Error, Finding, Result, Segment};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Aggregator settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Keep at most this many entries per category after deduplication
    #[serde(default)]
    pub max_per_category: Option<usize>,
}

/// One reported finding, resolved against its segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Segment text
    pub text: String,

    /// Saturated score in [0, 1)
    pub confidence: f32,

    /// Source page of the segment
    pub page: usize,

    /// Segment id within the document
    pub segment: usize,

    /// Ids of the patterns that hit
    pub patterns: Vec<String>,

    /// Sub-category labels of the patterns that hit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// The structured result for one document
///
/// Built in one go by [`Aggregator::aggregate`] and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    loopholes: BTreeMap<String, ReportEntry>,
    benefits: BTreeMap<String, ReportEntry>,
    major_exclusions: Vec<ReportEntry>,
    coverage_highlights: Vec<ReportEntry>,
}

impl AnalysisReport {
    /// Loopholes keyed by finding id
    pub fn loopholes(&self) -> &BTreeMap<String, ReportEntry> {
        &self.loopholes
    }

    /// Benefits keyed by finding id
    pub fn benefits(&self) -> &BTreeMap<String, ReportEntry> {
        &self.benefits
    }

    /// Exclusions in document order
    pub fn major_exclusions(&self) -> &[ReportEntry] {
        &self.major_exclusions
    }

    /// Coverage highlights in document order
    pub fn coverage_highlights(&self) -> &[ReportEntry] {
        &self.coverage_highlights
    }

    /// Entries of a category in stored order (document order for every bucket)
    pub fn entries(&self, category: Category) -> Vec<&ReportEntry> {
        match category {
            Category::Loophole => self.loopholes.values().collect(),
            Category::Benefit => self.benefits.values().collect(),
            Category::Exclusion => self.major_exclusions.iter().collect(),
            Category::CoverageHighlight => self.coverage_highlights.iter().collect(),
        }
    }

    /// Entries of a category by confidence, highest first; ties keep document order
    pub fn ranked(&self, category: Category) -> Vec<&ReportEntry> {
        let mut entries = self.entries(category);
        entries.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        entries
    }

    /// Number of entries in a category
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Loophole => self.loopholes.len(),
            Category::Benefit => self.benefits.len(),
            Category::Exclusion => self.major_exclusions.len(),
            Category::CoverageHighlight => self.coverage_highlights.len(),
        }
    }

    /// Total number of entries across all categories
    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.count(*c)).sum()
    }

    /// True when all four categories are empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Builds reports from classified findings
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    /// Create a new aggregator
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Build the report for one document
    ///
    /// `findings` must be in document order; deduplication keeps the first
    /// finding per category whose segment text normalizes to the same key.
    ///
    /// # Errors
    ///
    /// Returns a pipeline error if a finding refers to a segment that is not
    /// in `segments`.
    pub fn aggregate(&self, segments: &[Segment], findings: &[Finding]) -> Result<AnalysisReport> {
        let by_id: HashMap<usize, &Segment> = segments.iter().map(|s| (s.id, s)).collect();

        let mut buckets: [Vec<(String, ReportEntry)>; 4] = Default::default();
        let mut seen: [HashSet<String>; 4] = Default::default();
        let mut duplicates = 0;

        for finding in findings {
            let segment = by_id.get(&finding.segment_id).ok_or_else(|| {
                Error::pipeline(format!(
                    "finding {} refers to unknown segment {}",
                    finding.id(),
                    finding.segment_id
                ))
            })?;

            let slot = finding.category.index();
            if !seen[slot].insert(dedup_key(&segment.text)) {
                duplicates += 1;
                continue;
            }
            buckets[slot].push((finding.id(), entry(finding, segment)));
        }

        if duplicates > 0 {
            debug!("Dropped {} duplicate findings", duplicates);
        }

        let [loopholes, benefits, exclusions, highlights] = buckets;
        Ok(AnalysisReport {
            loopholes: self.cap_ranked(loopholes).into_iter().collect(),
            benefits: self.cap_ranked(benefits).into_iter().collect(),
            major_exclusions: self.cap_ordered(exclusions),
            coverage_highlights: self.cap_ordered(highlights),
        })
    }

    /// Keep the highest-confidence entries of a keyed bucket
    fn cap_ranked(&self, mut entries: Vec<(String, ReportEntry)>) -> Vec<(String, ReportEntry)> {
        if let Some(max) = self.config.max_per_category {
            entries.sort_by(|a, b| b.1.confidence.total_cmp(&a.1.confidence));
            entries.truncate(max);
        }
        entries
    }

    /// Keep the first entries of an ordered bucket
    fn cap_ordered(&self, entries: Vec<(String, ReportEntry)>) -> Vec<ReportEntry> {
        let max = self.config.max_per_category.unwrap_or(usize::MAX);
        entries.into_iter().take(max).map(|(_, entry)| entry).collect()
    }
}

/// Lowercased alphanumeric words joined by single spaces
pub fn dedup_key(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn entry(finding: &Finding, segment: &Segment) -> ReportEntry {
    ReportEntry {
        text: segment.text.clone(),
        confidence: finding.confidence,
        page: segment.source_page,
        segment: segment.id,
        patterns: finding.matched_patterns.iter().cloned().collect(),
        labels: finding.labels.iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn segment(id: usize, page: usize, text: &str) -> Segment {
        Segment {
            id,
            text: text.to_string(),
            source_page: page,
            source_range: (0, text.len()),
        }
    }

    fn finding(segment_id: usize, category: Category, confidence: f32) -> Finding {
        Finding {
            segment_id,
            category,
            confidence,
            matched_patterns: BTreeSet::from(["p".to_string()]),
            labels: BTreeSet::new(),
        }
    }

    #[test]
    fn test_dedup_key() {
        assert_eq!(
            dedup_key("This policy is governed by the laws of the issuing state."),
            dedup_key("this  policy is governed by the laws of the issuing STATE")
        );
        assert_ne!(dedup_key("Covered up to 5 days"), dedup_key("Covered up to 15 days"));
    }

    #[test]
    fn test_boilerplate_deduplicated_first_wins() {
        let boilerplate = "This policy is governed by the laws of the issuing state.";
        let segments = vec![segment(0, 0, boilerplate), segment(1, 1, boilerplate)];
        let findings = vec![
            finding(0, Category::Loophole, 0.4),
            finding(1, Category::Loophole, 0.4),
        ];

        let report = Aggregator::default().aggregate(&segments, &findings).unwrap();
        assert_eq!(report.loopholes().len(), 1);
        let (id, entry) = report.loopholes().iter().next().unwrap();
        assert_eq!(id, "loophole-000000");
        assert_eq!(entry.page, 0);
    }

    #[test]
    fn test_no_dedup_across_categories() {
        let segments = vec![segment(0, 0, "Cashless treatment is excluded abroad.")];
        let findings = vec![
            finding(0, Category::Benefit, 0.3),
            finding(0, Category::Exclusion, 0.4),
        ];
        let report = Aggregator::default().aggregate(&segments, &findings).unwrap();
        assert_eq!(report.benefits().len(), 1);
        assert_eq!(report.major_exclusions().len(), 1);
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn test_ordering_rules() {
        let segments = vec![
            segment(0, 0, "First exclusion sentence here."),
            segment(1, 0, "Second exclusion sentence here."),
            segment(2, 1, "Third exclusion sentence here."),
        ];
        let findings = vec![
            finding(0, Category::Exclusion, 0.2),
            finding(0, Category::Benefit, 0.2),
            finding(1, Category::Exclusion, 0.9),
            finding(1, Category::Benefit, 0.9),
            finding(2, Category::Exclusion, 0.5),
            finding(2, Category::Benefit, 0.2),
        ];
        let report = Aggregator::default().aggregate(&segments, &findings).unwrap();

        let exclusion_ids: Vec<usize> = report.major_exclusions().iter().map(|e| e.segment).collect();
        assert_eq!(exclusion_ids, vec![0, 1, 2]);

        let ranked: Vec<usize> = report.ranked(Category::Benefit).iter().map(|e| e.segment).collect();
        assert_eq!(ranked, vec![1, 0, 2]);
    }

    #[test]
    fn test_cap_per_category() {
        let segments: Vec<Segment> = (0..4)
            .map(|i| segment(i, 0, &format!("Exclusion number {} applies.", i)))
            .collect();
        let mut findings: Vec<Finding> = (0..4)
            .map(|i| finding(i, Category::Exclusion, 0.1 * (i + 1) as f32))
            .collect();
        findings.extend((0..4).map(|i| finding(i, Category::Loophole, 0.1 * (i + 1) as f32)));

        let aggregator = Aggregator::new(AggregatorConfig {
            max_per_category: Some(2),
        });
        let report = aggregator.aggregate(&segments, &findings).unwrap();

        let exclusions: Vec<usize> = report.major_exclusions().iter().map(|e| e.segment).collect();
        assert_eq!(exclusions, vec![0, 1]);

        let loopholes: Vec<&str> = report.loopholes().keys().map(String::as_str).collect();
        assert_eq!(loopholes, vec!["loophole-000002", "loophole-000003"]);
    }

    #[test]
    fn test_keyed_buckets_follow_document_order() {
        let segments = vec![
            segment(9_999, 40, "Room rent is capped at one percent."),
            segment(10_000, 41, "Ambulance cover is capped at two thousand."),
        ];
        let findings = vec![
            finding(9_999, Category::Loophole, 0.5),
            finding(10_000, Category::Loophole, 0.5),
        ];
        let report = Aggregator::default().aggregate(&segments, &findings).unwrap();

        let order: Vec<usize> = report.loopholes().values().map(|e| e.segment).collect();
        assert_eq!(order, vec![9_999, 10_000]);
    }

    #[test]
    fn test_unknown_segment_is_pipeline_error() {
        let err = Aggregator::default()
            .aggregate(&[], &[finding(9, Category::Benefit, 0.5)])
            .unwrap_err();
        assert!(matches!(err, Error::Pipeline(_)));
    }

    #[test]
    fn test_empty_input_gives_empty_report() {
        let report = Aggregator::default().aggregate(&[], &[]).unwrap();
        assert!(report.is_empty());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "loopholes": {},
                "benefits": {},
                "major_exclusions": [],
                "coverage_highlights": []
            })
        );
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let segments = vec![
            segment(0, 0, "Room rent is capped."),
            segment(1, 1, "Room rent is capped."),
        ];
        let findings = vec![finding(0, Category::Loophole, 0.3), finding(1, Category::Loophole, 0.3)];
        let aggregator = Aggregator::default();
        assert_eq!(
            aggregator.aggregate(&segments, &findings).unwrap(),
            aggregator.aggregate(&segments, &findings).unwrap()
        );
    }
}
