//! Configuration for pattern sets and the analysis pipeline

use crate::aggregator::AggregatorConfig;
use crate::classifier::ClassifierConfig;
use crate::normalizer::NormalizerConfig;
use crate::segmenter::SegmenterConfig;
use policyscan_core::{Category, Error, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Versioned pattern set, as written in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSetSpec {
    /// Pattern set version, reported alongside analysis results
    #[serde(default = "default_version")]
    pub version: String,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Patterns per category
    #[serde(default, deserialize_with = "deserialize_categories")]
    pub categories: BTreeMap<Category, CategorySpec>,
}

/// Patterns and suppressors of one category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Weighted patterns; a hit adds its weight to the category score
    #[serde(default)]
    pub patterns: Vec<PatternSpec>,

    /// Matchers that veto this category for a segment when they hit
    #[serde(default)]
    pub suppressors: Vec<MatcherSpec>,
}

/// A single weighted pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Pattern identifier; defaults to `<category>-<position>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// What to match
    #[serde(flatten)]
    pub matcher: MatcherSpec,

    /// Positive weight added to the category score on a hit
    #[serde(default = "default_weight")]
    pub weight: f32,

    /// Optional sub-category label (e.g. `ambiguous_language`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Matcher definition: exactly one of `keywords` or `regex`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatcherSpec {
    /// Case-insensitive, word-boundary aware phrases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,

    /// Case-insensitive regular expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

impl MatcherSpec {
    /// Keyword matcher spec
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: Some(keywords.into_iter().map(Into::into).collect()),
            regex: None,
        }
    }

    /// Regex matcher spec
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            keywords: None,
            regex: Some(pattern.into()),
        }
    }
}

impl PatternSpec {
    /// Pattern with the given matcher and weight
    pub fn new(matcher: MatcherSpec, weight: f32) -> Self {
        Self {
            id: None,
            matcher,
            weight,
            label: None,
        }
    }

    /// Set the pattern id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the sub-category label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl PatternSetSpec {
    /// Empty pattern set with the given version
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            description: None,
            categories: BTreeMap::new(),
        }
    }

    /// Add a pattern to a category
    pub fn with_pattern(mut self, category: Category, pattern: PatternSpec) -> Self {
        self.categories.entry(category).or_default().patterns.push(pattern);
        self
    }

    /// Add a suppressor to a category
    pub fn with_suppressor(mut self, category: Category, matcher: MatcherSpec) -> Self {
        self.categories.entry(category).or_default().suppressors.push(matcher);
        self
    }

    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse pattern set: {}", e)))
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }
}

/// Settings for every stage of the analysis pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    #[serde(default)]
    pub segmenter: SegmenterConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub aggregator: AggregatorConfig,
}

impl AnalysisConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse analysis config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no pipeline can run with
    pub fn validate(&self) -> Result<()> {
        let threshold = self.classifier.acceptance_threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "acceptance_threshold must be in [0, 1), got {}",
                threshold
            )));
        }
        if self.aggregator.max_per_category == Some(0) {
            return Err(Error::config("max_per_category must be at least 1"));
        }
        Ok(())
    }
}

/// Category map that rejects a category given twice, e.g. as both
/// `benefit` and `benefits`
fn deserialize_categories<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<Category, CategorySpec>, D::Error>
where
    D: Deserializer<'de>,
{
    struct CategoriesVisitor;

    impl<'de> Visitor<'de> for CategoriesVisitor {
        type Value = BTreeMap<Category, CategorySpec>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map from category name to patterns")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut categories = BTreeMap::new();
            let mut names: BTreeMap<Category, String> = BTreeMap::new();

            while let Some((name, spec)) = map.next_entry::<String, CategorySpec>()? {
                let category: Category = name.parse().map_err(de::Error::custom)?;
                if let Some(previous) = names.insert(category, name.clone()) {
                    return Err(de::Error::custom(format!(
                        "category '{}' is declared twice (as '{}' and '{}')",
                        category, previous, name
                    )));
                }
                categories.insert(category, spec);
            }

            Ok(categories)
        }
    }

    deserializer.deserialize_map(CategoriesVisitor)
}

fn default_version() -> String {
    "1".to_string()
}

fn default_weight() -> f32 {
    1.0
}
