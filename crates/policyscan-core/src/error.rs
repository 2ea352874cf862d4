//! Error types for PolicyScan

/// Result type alias using PolicyScan's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for PolicyScan operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors (pattern sets, analysis settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// A single pattern definition could not be compiled
    #[error("invalid pattern '{id}': {reason}")]
    Pattern { id: String, reason: String },

    /// Document text could not be extracted
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Unexpected fault while normalizing, segmenting, classifying or aggregating
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new pattern error
    pub fn pattern(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Pattern {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a new extraction error
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Create a new pipeline error
    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    /// Whether this error stems from configuration rather than a document
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Pattern { .. })
    }
}
