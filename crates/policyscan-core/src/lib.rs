//! PolicyScan Core
//!
//! Core types and error handling shared across PolicyScan components.
//!
//! This crate provides:
//! - Document text types handed over by the extraction layer
//! - Segments, categories and findings produced by the analysis pipeline
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Category, Finding, PageText, RawDocumentText, Segment, FINDING_ID_DIGITS};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Category, Finding, PageText, RawDocumentText, Segment};
}
