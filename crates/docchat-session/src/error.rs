//! Error types for the session engine.

use docchat_core::error::DocchatError;

/// Errors from the session engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("file is too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: usize, limit: usize },
    #[error("upload rejected: {0}")]
    UploadRejected(String),
    #[error("upload failed: {0}")]
    UploadTransport(String),
    #[error("an upload is already in progress")]
    UploadInProgress,
    #[error("no document has been uploaded")]
    NoDocument,
    #[error("the document is still being processed")]
    DocumentProcessing,
    #[error("a question is already in flight")]
    QueryInFlight,
    #[error("question cannot be empty")]
    EmptyQuestion,
    #[error("query rejected: {0}")]
    QueryRejected(String),
    #[error("query failed: {0}")]
    QueryTransport(String),
    #[error("operation interrupted by session reset")]
    Interrupted,
    #[error("session invariant violated: {0}")]
    Invariant(String),
}

impl From<SessionError> for DocchatError {
    fn from(err: SessionError) -> Self {
        DocchatError::Session(err.to_string())
    }
}
