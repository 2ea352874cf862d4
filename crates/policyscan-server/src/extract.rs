//! Document text extraction
//!
//! The analysis pipeline only sees page texts; turning uploaded bytes into
//! those texts happens here, behind [`TextExtractor`] so handlers can be
//! exercised without real PDFs.

use policyscan_core::{Error, RawDocumentText, Result};
use tracing::{debug, warn};

/// Converts an uploaded document into ordered page texts
pub trait TextExtractor: Send + Sync {
    /// Extract the text of every page
    ///
    /// Pages without a text layer come back empty; only documents that cannot
    /// be read at all are an error.
    fn extract(&self, bytes: &[u8]) -> Result<RawDocumentText>;

    /// Extractor name for logs
    fn name(&self) -> &str;
}

/// PDF extraction backed by `pdf-extract`
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<RawDocumentText> {
        if !bytes.starts_with(b"%PDF") {
            return Err(Error::extraction("file is not a PDF document"));
        }

        // pdf-extract re-exports Document from lopdf
        let doc = pdf_extract::Document::load_mem(bytes)
            .map_err(|e| Error::extraction(format!("Failed to load PDF: {}", e)))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let mut pages = Vec::with_capacity(page_numbers.len());
        for page_number in &page_numbers {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    warn!(page = *page_number, error = %e, "Failed to extract page text");
                    pages.push(String::new());
                }
            }
        }

        if pages.iter().all(|p| p.trim().is_empty()) {
            // per-page extraction misses some font encodings the whole-document path handles
            match pdf_extract::extract_text_from_mem(bytes) {
                Ok(text) if !text.trim().is_empty() => {
                    debug!("Per-page extraction was empty, using whole-document text");
                    return Ok(RawDocumentText::from_pages([text]));
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Whole-document extraction failed"),
            }
        }

        debug!("Extracted {} pages", pages.len());
        Ok(RawDocumentText::from_pages(pages))
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let err = PdfTextExtractor::new().extract(b"hello world").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
