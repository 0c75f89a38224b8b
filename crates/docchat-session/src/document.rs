//! Upload lifecycle state for the active document.
//!
//! One session holds at most one document. Uploading a new document replaces
//! the previous one on success; a failed upload leaves the previous document
//! intact and records the failure reason.

use docchat_backend::DocumentFacts;
use docchat_core::DocumentName;

use crate::error::SessionError;

/// The session's view of its active document.
#[derive(Debug, Clone, Default)]
pub struct DocumentHandle {
    name: Option<DocumentName>,
    processing: bool,
    facts: Option<DocumentFacts>,
    last_error: Option<String>,
}

impl DocumentHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an upload as started.
    ///
    /// Fails if an upload is already in progress; the in-flight upload owns
    /// the handle until it completes or fails.
    pub fn begin_upload(&mut self) -> Result<(), SessionError> {
        if self.processing {
            return Err(SessionError::UploadInProgress);
        }
        tracing::debug!("Document upload started");
        self.processing = true;
        self.last_error = None;
        Ok(())
    }

    /// Install the newly uploaded document.
    ///
    /// Counts may be absent when local inspection could not read the bytes.
    pub fn complete_upload(&mut self, name: DocumentName, facts: Option<DocumentFacts>) {
        tracing::debug!(name = %name, "Document ready");
        self.name = Some(name);
        self.facts = facts;
        self.processing = false;
        self.last_error = None;
    }

    /// Record a failed upload, keeping any previously loaded document.
    pub fn fail_upload(&mut self, reason: &str) {
        tracing::debug!(reason, "Document upload failed");
        self.processing = false;
        self.last_error = Some(reason.to_string());
    }

    /// Return to the initial empty state.
    pub fn reset(&mut self) {
        self.name = None;
        self.processing = false;
        self.facts = None;
        self.last_error = None;
    }

    /// A document name is present, whether or not an upload is running.
    pub fn is_loaded(&self) -> bool {
        self.name.is_some()
    }

    /// A document is loaded and no upload is running.
    pub fn is_ready(&self) -> bool {
        self.name.is_some() && !self.processing
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn name(&self) -> Option<&DocumentName> {
        self.name.as_ref()
    }

    pub fn facts(&self) -> Option<&DocumentFacts> {
        self.facts.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
