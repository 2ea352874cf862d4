//! Pattern registry loading and lookup
//!
//! The registry is built once at startup from a versioned pattern set and is
//! immutable afterwards. Share it behind an `Arc`; readers need no locking.

use crate::config::{CategorySpec, PatternSetSpec};
use crate::patterns::{Matcher, Pattern};
use policyscan_core::{Category, Error, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Pattern set shipped with the crate
pub const BUILTIN_PATTERNS: &str = include_str!("../patterns/default.yaml");

/// Compiled patterns and suppressors of one category
#[derive(Debug, Clone, Default)]
pub struct CategoryPatterns {
    patterns: Vec<Pattern>,
    suppressors: Vec<Matcher>,
}

impl CategoryPatterns {
    /// Weighted patterns
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Veto matchers
    pub fn suppressors(&self) -> &[Matcher] {
        &self.suppressors
    }

    /// True if any suppressor hits `text`
    pub fn is_suppressed(&self, text: &str) -> bool {
        self.suppressors.iter().any(|s| s.is_match(text))
    }
}

/// Read-only mapping from category to its compiled patterns
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    version: String,
    description: Option<String>,
    categories: [CategoryPatterns; 4],
}

impl PatternRegistry {
    /// Compile and validate a pattern set
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any regex is malformed, a weight is not
    /// positive, a keyword list is empty, a pattern declares both or neither
    /// matcher kinds, or two patterns share an id.
    pub fn from_spec(spec: PatternSetSpec) -> Result<Self> {
        let mut categories: [CategoryPatterns; 4] = Default::default();
        let mut seen_ids = HashSet::new();

        for (category, category_spec) in spec.categories {
            categories[category.index()] =
                compile_category(category, category_spec, &mut seen_ids)?;
        }

        let registry = Self {
            version: spec.version,
            description: spec.description,
            categories,
        };

        info!(
            "Loaded pattern set v{} with {} patterns",
            registry.version,
            registry.pattern_count()
        );
        for category in Category::ALL {
            debug!(
                "  {}: {} patterns, {} suppressors",
                category,
                registry.patterns(category).len(),
                registry.category(category).suppressors().len()
            );
        }

        Ok(registry)
    }

    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_spec(PatternSetSpec::from_yaml(yaml)?)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading pattern set from: {}", path.display());
        let spec = PatternSetSpec::from_file(path).map_err(|e| {
            Error::config(format!("Failed to load pattern set {}: {}", path.display(), e))
        })?;
        Self::from_spec(spec)
    }

    /// The built-in insurance policy pattern set
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_PATTERNS)
    }

    /// Pattern set version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Pattern set description
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Patterns and suppressors of a category
    pub fn category(&self, category: Category) -> &CategoryPatterns {
        &self.categories[category.index()]
    }

    /// Patterns of a category
    pub fn patterns(&self, category: Category) -> &[Pattern] {
        self.category(category).patterns()
    }

    /// Total number of weighted patterns
    pub fn pattern_count(&self) -> usize {
        self.categories.iter().map(|c| c.patterns.len()).sum()
    }

    /// True if no category has any pattern
    pub fn is_empty(&self) -> bool {
        self.pattern_count() == 0
    }
}

fn compile_category(
    category: Category,
    spec: CategorySpec,
    seen_ids: &mut HashSet<String>,
) -> Result<CategoryPatterns> {
    let mut patterns = Vec::with_capacity(spec.patterns.len());

    for (position, pattern_spec) in spec.patterns.into_iter().enumerate() {
        let id = pattern_spec
            .id
            .unwrap_or_else(|| format!("{}-{}", category, position + 1));

        if !seen_ids.insert(id.clone()) {
            return Err(Error::config(format!("duplicate pattern id '{}'", id)));
        }

        let matcher = Matcher::compile(&id, &pattern_spec.matcher)?;
        patterns.push(Pattern::new(
            id,
            category,
            matcher,
            pattern_spec.weight,
            pattern_spec.label,
        )?);
    }

    let suppressors = spec
        .suppressors
        .iter()
        .enumerate()
        .map(|(position, matcher)| {
            Matcher::compile_exact(&format!("{}-suppressor-{}", category, position + 1), matcher)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CategoryPatterns {
        patterns,
        suppressors,
    })
}
