use serde::{Deserialize, Serialize};

use crate::types::{DocumentName, Timestamp, TurnId};

/// All domain events that can occur in a docchat session.
///
/// Events are emitted by the session aggregate after state changes and
/// consumed by:
/// - The broadcast channel (for UI notifications)
/// - The event log (for audit/debugging)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SessionEvent {
    // =========================================================================
    // Upload Events
    // =========================================================================
    /// A document passed validation and its transfer began.
    UploadStarted {
        file_name: String,
        size_bytes: usize,
        timestamp: Timestamp,
    },

    /// A document was rejected by local validation before any network call.
    UploadRejected {
        file_name: String,
        reason: String,
        timestamp: Timestamp,
    },

    /// The backend accepted the document and it is ready for questions.
    /// Counts are absent when local extraction could not read the bytes.
    DocumentReady {
        name: DocumentName,
        pages: Option<usize>,
        characters: Option<usize>,
        timestamp: Timestamp,
    },

    /// The backend rejected the document or the transfer failed.
    UploadFailed {
        file_name: String,
        reason: String,
        timestamp: Timestamp,
    },

    // =========================================================================
    // Query Events
    // =========================================================================
    /// A question was accepted and its user turn appended.
    QueryDispatched {
        turn_id: TurnId,
        timestamp: Timestamp,
    },

    /// The backend answered and the assistant turn was staged for reveal.
    AnswerReceived {
        reference_count: usize,
        timestamp: Timestamp,
    },

    /// The reveal finished and the assistant turn was committed.
    AnswerCommitted {
        turn_id: TurnId,
        timestamp: Timestamp,
    },

    /// The backend rejected the question or the transfer failed.
    QueryFailed {
        reason: String,
        timestamp: Timestamp,
    },

    // =========================================================================
    // Reveal / Reset Events
    // =========================================================================
    /// A reveal in progress was cancelled and its buffer discarded.
    RevealCancelled {
        discarded_chars: usize,
        timestamp: Timestamp,
    },

    /// The session was torn down to its initial state.
    SessionReset {
        discarded_turns: usize,
        timestamp: Timestamp,
    },
}

impl SessionEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            SessionEvent::UploadStarted { timestamp, .. }
            | SessionEvent::UploadRejected { timestamp, .. }
            | SessionEvent::DocumentReady { timestamp, .. }
            | SessionEvent::UploadFailed { timestamp, .. }
            | SessionEvent::QueryDispatched { timestamp, .. }
            | SessionEvent::AnswerReceived { timestamp, .. }
            | SessionEvent::AnswerCommitted { timestamp, .. }
            | SessionEvent::QueryFailed { timestamp, .. }
            | SessionEvent::RevealCancelled { timestamp, .. }
            | SessionEvent::SessionReset { timestamp, .. } => *timestamp,
        }
    }

    /// Returns a human-readable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            SessionEvent::UploadStarted { .. } => "upload_started",
            SessionEvent::UploadRejected { .. } => "upload_rejected",
            SessionEvent::DocumentReady { .. } => "document_ready",
            SessionEvent::UploadFailed { .. } => "upload_failed",
            SessionEvent::QueryDispatched { .. } => "query_dispatched",
            SessionEvent::AnswerReceived { .. } => "answer_received",
            SessionEvent::AnswerCommitted { .. } => "answer_committed",
            SessionEvent::QueryFailed { .. } => "query_failed",
            SessionEvent::RevealCancelled { .. } => "reveal_cancelled",
            SessionEvent::SessionReset { .. } => "session_reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_timestamp() {
        let ts = Timestamp::now();
        let event = SessionEvent::QueryDispatched {
            turn_id: TurnId(1),
            timestamp: ts,
        };
        assert_eq!(event.timestamp(), ts);
    }

    #[test]
    fn test_event_name() {
        let event = SessionEvent::DocumentReady {
            name: DocumentName::new("handbook.pdf"),
            pages: Some(12),
            characters: Some(30_000),
            timestamp: Timestamp::now(),
        };
        assert_eq!(event.event_name(), "document_ready");
    }

    #[test]
    fn test_event_serialization() {
        let event = SessionEvent::SessionReset {
            discarded_turns: 4,
            timestamp: Timestamp::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("SessionReset"));
    }

    #[test]
    fn test_upload_event_names() {
        let ts = Timestamp::now();

        let started = SessionEvent::UploadStarted {
            file_name: "handbook.pdf".to_string(),
            size_bytes: 2 * 1024 * 1024,
            timestamp: ts,
        };
        assert_eq!(started.event_name(), "upload_started");

        let rejected = SessionEvent::UploadRejected {
            file_name: "notes.txt".to_string(),
            reason: "unsupported file type".to_string(),
            timestamp: ts,
        };
        assert_eq!(rejected.event_name(), "upload_rejected");

        let failed = SessionEvent::UploadFailed {
            file_name: "handbook.pdf".to_string(),
            reason: "connection refused".to_string(),
            timestamp: ts,
        };
        assert_eq!(failed.event_name(), "upload_failed");
    }

    #[test]
    fn test_query_event_names() {
        let ts = Timestamp::now();

        let dispatched = SessionEvent::QueryDispatched {
            turn_id: TurnId(3),
            timestamp: ts,
        };
        assert_eq!(dispatched.event_name(), "query_dispatched");

        let received = SessionEvent::AnswerReceived {
            reference_count: 5,
            timestamp: ts,
        };
        assert_eq!(received.event_name(), "answer_received");

        let committed = SessionEvent::AnswerCommitted {
            turn_id: TurnId(4),
            timestamp: ts,
        };
        assert_eq!(committed.event_name(), "answer_committed");

        let failed = SessionEvent::QueryFailed {
            reason: "HTTP 500".to_string(),
            timestamp: ts,
        };
        assert_eq!(failed.event_name(), "query_failed");
    }

    #[test]
    fn test_reveal_cancelled_event() {
        let event = SessionEvent::RevealCancelled {
            discarded_chars: 42,
            timestamp: Timestamp::now(),
        };
        assert_eq!(event.event_name(), "reveal_cancelled");
    }

    #[test]
    fn test_document_ready_without_counts() {
        let event = SessionEvent::DocumentReady {
            name: DocumentName::new("scan.pdf"),
            pages: None,
            characters: None,
            timestamp: Timestamp::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let rt: SessionEvent = serde_json::from_str(&json).unwrap();
        match rt {
            SessionEvent::DocumentReady {
                pages, characters, ..
            } => {
                assert!(pages.is_none());
                assert!(characters.is_none());
            }
            _ => panic!("Expected DocumentReady variant"),
        }
    }

    #[test]
    fn test_event_json_round_trip() {
        let event = SessionEvent::AnswerReceived {
            reference_count: 2,
            timestamp: Timestamp::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let rt: SessionEvent = serde_json::from_str(&json).unwrap();
        match rt {
            SessionEvent::AnswerReceived {
                reference_count, ..
            } => assert_eq!(reference_count, 2),
            _ => panic!("Expected AnswerReceived variant"),
        }
    }
}
