//! Pre-flight validation for document uploads.
//!
//! Validation runs before any network call or state change, so a rejected
//! file leaves the session exactly as it was.

use crate::error::SessionError;

/// Largest accepted document. A file of exactly this size passes.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Check a candidate document's declared type and size.
///
/// The type check matches the backend's own acceptance rule: any MIME type
/// containing `pdf`.
pub fn validate_document(content_type: &str, size_bytes: usize) -> Result<(), SessionError> {
    if !content_type.contains("pdf") {
        return Err(SessionError::UnsupportedType(content_type.to_string()));
    }
    if size_bytes > MAX_DOCUMENT_BYTES {
        return Err(SessionError::FileTooLarge {
            size: size_bytes,
            limit: MAX_DOCUMENT_BYTES,
        });
    }
    Ok(())
}
