//! Local document inspection for display metadata.
//!
//! The backend owns real parsing and indexing; this module only recovers
//! page and character counts from raw bytes so the application can show
//! "Extracted N characters from M pages" without waiting on a second round
//! trip. Failures here never fail an upload.

use async_trait::async_trait;
use lopdf::Document;
use tracing::debug;

use crate::error::ExtractError;

/// Metadata recovered from a document's raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFacts {
    /// Number of pages found.
    pub pages: usize,
    /// Character count of the recovered text.
    pub characters: usize,
    /// Plain text recovered from the document.
    pub text: String,
}

impl DocumentFacts {
    /// Build facts from recovered text; `characters` is derived from it.
    pub fn from_text(pages: usize, text: String) -> Self {
        let characters = text.chars().count();
        Self {
            pages,
            characters,
            text,
        }
    }
}

/// Service deriving display metadata from raw document bytes.
#[async_trait]
pub trait DocumentInspector: Send + Sync {
    /// Recover page and character counts from the given bytes.
    async fn inspect(&self, bytes: &[u8]) -> Result<DocumentFacts, ExtractError>;
}

/// Inspector backed by a real PDF parser.
///
/// Page count comes from the parsed page tree; text is extracted per page,
/// including flate-compressed content streams. A page whose text cannot be
/// decoded contributes nothing to the count.
pub struct PdfInspector;

impl PdfInspector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentInspector for PdfInspector {
    async fn inspect(&self, bytes: &[u8]) -> Result<DocumentFacts, ExtractError> {
        let doc =
            Document::load_mem(bytes).map_err(|e| ExtractError::Unreadable(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(ExtractError::Unreadable(
                "document is encrypted".to_string(),
            ));
        }
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(ExtractError::NoPages);
        }

        let mut text = String::new();
        for (&page_num, _) in &pages {
            match doc.extract_text(&[page_num]) {
                Ok(content) => {
                    text.push_str(&content);
                    text.push('\n');
                }
                Err(err) => {
                    debug!(page = page_num, %err, "Page text not decodable");
                }
            }
        }

        let facts = DocumentFacts::from_text(pages.len(), text);
        debug!(
            pages = facts.pages,
            characters = facts.characters,
            "Inspected document"
        );
        Ok(facts)
    }
}

/// Mock inspector for tests: fixed facts or a scripted failure.
pub struct MockInspector {
    result: Result<DocumentFacts, ExtractError>,
}

impl MockInspector {
    /// An inspector that always reports the given counts.
    pub fn new(pages: usize, characters: usize) -> Self {
        Self {
            result: Ok(DocumentFacts {
                pages,
                characters,
                text: String::new(),
            }),
        }
    }

    /// An inspector that always fails.
    pub fn failing() -> Self {
        Self {
            result: Err(ExtractError::Unreadable("mock failure".to_string())),
        }
    }
}

#[async_trait]
impl DocumentInspector for MockInspector {
    async fn inspect(&self, _bytes: &[u8]) -> Result<DocumentFacts, ExtractError> {
        self.result.clone()
    }
}
