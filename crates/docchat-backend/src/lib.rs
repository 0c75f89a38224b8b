//! Client for the document-QA retrieval backend.
//!
//! The backend exposes two endpoints: `POST /upload` (multipart document
//! ingestion) and `POST /query` (JSON question answering). This crate wraps
//! them behind the [`RetrievalBackend`] trait, and pairs them with local
//! document inspection so the application can show page and character counts
//! without a round trip.

pub mod error;
pub mod extract;
pub mod http;
pub mod mock;

pub use error::{BackendError, ExtractError};
pub use extract::{DocumentFacts, DocumentInspector, MockInspector, PdfInspector};
pub use http::HttpBackend;
pub use mock::MockBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A document file staged for upload.
#[derive(Debug, Clone)]
pub struct DocumentPayload {
    /// File name as chosen by the user, sent as the multipart file name.
    pub file_name: String,
    /// MIME type of the file (e.g. `application/pdf`).
    pub content_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl DocumentPayload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// A question in the exact shape the backend expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskRequest {
    /// The question text.
    pub query: String,
    /// Number of supporting excerpts to retrieve.
    pub top_k: usize,
    /// Name of the document to search, as confirmed at upload time.
    pub doc_id: String,
}

/// Reply to a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadAck {
    /// Status message for the success notification.
    #[serde(default)]
    pub message: String,
    /// Document name as the backend stored it.
    pub file_name: Option<String>,
    /// How many chunks the backend indexed.
    pub num_chunks: Option<usize>,
}

/// Reply to a successful query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Answer {
    /// The answer text.
    pub response: String,
    /// Supporting excerpts the answer was grounded on.
    #[serde(default)]
    pub retrieved_chunks: Vec<String>,
}

/// Transfer interface to the retrieval backend.
///
/// Implementations perform exactly one attempt per call; retry policy, if
/// any, belongs to the caller. The trait is object-safe so sessions can hold
/// `Arc<dyn RetrievalBackend>` and tests can substitute [`MockBackend`].
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    /// Submit a document for ingestion and indexing.
    async fn submit_document(&self, payload: DocumentPayload) -> Result<UploadAck, BackendError>;

    /// Ask a question against a previously submitted document.
    async fn ask(&self, request: AskRequest) -> Result<Answer, BackendError>;
}
