//! Error types for the retrieval backend client.

use docchat_core::error::DocchatError;

/// Errors from backend transfers.
///
/// `Rejected` means the backend answered with a non-2xx status; its `detail`
/// is the human-readable reason from the error body. `Transport` covers
/// connection and timeout failures where no reply arrived at all.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("backend rejected the request ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    InvalidResponse(String),
}

impl From<BackendError> for DocchatError {
    fn from(err: BackendError) -> Self {
        DocchatError::Backend(err.to_string())
    }
}

/// Errors from local document inspection.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractError {
    #[error("unreadable document: {0}")]
    Unreadable(String),
    #[error("no pages found in document")]
    NoPages,
}

impl From<ExtractError> for DocchatError {
    fn from(err: ExtractError) -> Self {
        DocchatError::Extraction(err.to_string())
    }
}
