//! Conversation orchestration for docchat.
//!
//! Owns the client-side session state for one document QA conversation:
//! the active document, the turn timeline, the typewriter reveal, and the
//! dispatch rules tying them together.

pub mod animator;
pub mod document;
pub mod error;
pub mod session;
pub mod timeline;
pub mod upload;

pub use animator::{RevealAnimator, RevealState};
pub use document::DocumentHandle;
pub use error::SessionError;
pub use session::{ChatSession, SessionConfig, UploadReceipt};
pub use timeline::Timeline;
pub use upload::{validate_document, MAX_DOCUMENT_BYTES};
