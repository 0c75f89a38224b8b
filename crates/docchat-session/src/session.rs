//! Session aggregate: wires the document handle, timeline, and reveal
//! animator behind one lock and drives the upload and query flows.
//!
//! The lock is a `std::sync::Mutex` and is never held across an await.
//! Long-running work (backend calls, the reply delay, reveal ticks) runs
//! between lock scopes; each scope re-checks the reset epoch and discards
//! its result when a reset intervened.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{broadcast, watch, Notify};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use docchat_backend::{
    AskRequest, BackendError, DocumentFacts, DocumentInspector, DocumentPayload, RetrievalBackend,
};
use docchat_core::config::DocchatConfig;
use docchat_core::events::SessionEvent;
use docchat_core::{DocumentName, Timestamp, Turn};

use crate::animator::RevealAnimator;
use crate::document::DocumentHandle;
use crate::error::SessionError;
use crate::timeline::Timeline;
use crate::upload::validate_document;

/// Broadcast capacity for session events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Pacing and retrieval settings for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Number of supporting excerpts requested per question.
    pub top_k: usize,
    /// Pause between accepting a question and calling the backend.
    pub reply_delay: Duration,
    /// Time between reveal ticks.
    pub reveal_interval: Duration,
    /// Characters revealed per tick.
    pub reveal_step: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            reply_delay: Duration::from_millis(1200),
            reveal_interval: Duration::from_millis(10),
            reveal_step: 1,
        }
    }
}

impl SessionConfig {
    pub fn from_config(config: &DocchatConfig) -> Self {
        Self {
            top_k: config.backend.top_k,
            reply_delay: Duration::from_millis(config.conversation.reply_delay_ms),
            reveal_interval: Duration::from_millis(config.conversation.reveal_interval_ms.max(1)),
            reveal_step: config.conversation.reveal_chunk_chars,
        }
    }
}

/// Outcome of a successful upload, for the caller's success notification.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub name: DocumentName,
    pub message: String,
    pub pages: Option<usize>,
    pub characters: Option<usize>,
}

/// All mutable session state, guarded as one unit.
struct SessionInner {
    document: DocumentHandle,
    timeline: Timeline,
    animator: RevealAnimator,
    query_in_flight: bool,
    epoch: u64,
}

/// One conversation over one document.
///
/// Methods take `&self`; the session is shared behind an `Arc` between the
/// REPL task and any observer draining the event subscription.
pub struct ChatSession {
    id: Uuid,
    backend: Arc<dyn RetrievalBackend>,
    inspector: Arc<dyn DocumentInspector>,
    config: SessionConfig,
    inner: Mutex<SessionInner>,
    events: broadcast::Sender<SessionEvent>,
    reveal_tx: watch::Sender<String>,
    // held so reveal publishes never fail with no subscriber
    reveal_rx: watch::Receiver<String>,
    interrupt: Notify,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn RetrievalBackend>,
        inspector: Arc<dyn DocumentInspector>,
        config: SessionConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (reveal_tx, reveal_rx) = watch::channel(String::new());
        let id = Uuid::new_v4();
        let reveal_step = config.reveal_step;
        info!(session_id = %id, "Chat session created");
        Self {
            id,
            backend,
            inspector,
            config,
            inner: Mutex::new(SessionInner {
                document: DocumentHandle::new(),
                timeline: Timeline::new(),
                animator: RevealAnimator::new(reveal_step),
                query_in_flight: false,
                epoch: 0,
            }),
            events: event_tx,
            reveal_tx,
            reveal_rx,
            interrupt: Notify::new(),
        }
    }

    /// Validate, transfer, and install a document.
    ///
    /// The backend transfer and local inspection run concurrently; a failed
    /// inspection only omits the counts from the receipt.
    pub async fn upload_document(
        &self,
        payload: DocumentPayload,
    ) -> Result<UploadReceipt, SessionError> {
        if let Err(err) = validate_document(&payload.content_type, payload.bytes.len()) {
            warn!(session_id = %self.id, file_name = %payload.file_name, %err, "Document rejected");
            self.emit(SessionEvent::UploadRejected {
                file_name: payload.file_name.clone(),
                reason: err.to_string(),
                timestamp: Timestamp::now(),
            });
            return Err(err);
        }

        let epoch = {
            let mut inner = self.lock_inner()?;
            inner.document.begin_upload()?;
            inner.epoch
        };
        self.emit(SessionEvent::UploadStarted {
            file_name: payload.file_name.clone(),
            size_bytes: payload.bytes.len(),
            timestamp: Timestamp::now(),
        });

        let local_name = payload.file_name.clone();
        let bytes = payload.bytes.clone();
        let (submitted, inspected) = tokio::join!(
            self.backend.submit_document(payload),
            self.inspector.inspect(&bytes)
        );

        let mut inner = self.lock_inner()?;
        if inner.epoch != epoch {
            debug!(session_id = %self.id, "Upload outcome discarded after reset");
            return Err(SessionError::Interrupted);
        }

        let ack = match submitted {
            Ok(ack) => ack,
            Err(err) => {
                let reason = match &err {
                    BackendError::Rejected { detail, .. } => detail.clone(),
                    other => other.to_string(),
                };
                let session_err = match err {
                    BackendError::Rejected { .. } => SessionError::UploadRejected(reason.clone()),
                    _ => SessionError::UploadTransport(reason.clone()),
                };
                inner.document.fail_upload(&reason);
                drop(inner);
                warn!(session_id = %self.id, file_name = %local_name, %reason, "Upload failed");
                self.emit(SessionEvent::UploadFailed {
                    file_name: local_name,
                    reason,
                    timestamp: Timestamp::now(),
                });
                return Err(session_err);
            }
        };

        let name = DocumentName::new(ack.file_name.unwrap_or(local_name));
        let facts = match inspected {
            Ok(facts) => Some(facts),
            Err(err) => {
                warn!(session_id = %self.id, %err, "Local inspection failed");
                None
            }
        };
        let receipt = UploadReceipt {
            name: name.clone(),
            message: ack.message,
            pages: facts.as_ref().map(|f| f.pages),
            characters: facts.as_ref().map(|f| f.characters),
        };
        inner.document.complete_upload(name.clone(), facts);
        drop(inner);
        info!(session_id = %self.id, name = %name, "Document uploaded");
        self.emit(SessionEvent::DocumentReady {
            name,
            pages: receipt.pages,
            characters: receipt.characters,
            timestamp: Timestamp::now(),
        });
        Ok(receipt)
    }

    /// Dispatch a question and return the committed assistant turn.
    ///
    /// The user turn is appended before the backend call, so it is
    /// observable while the answer is still in flight. The returned turn is
    /// only committed after its text has fully revealed.
    pub async fn send_message(&self, text: &str) -> Result<Turn, SessionError> {
        let (epoch, doc_name, query) = {
            let mut inner = self.lock_inner()?;
            let name = match inner.document.name() {
                Some(name) => name.clone(),
                None => return Err(SessionError::NoDocument),
            };
            if inner.document.is_processing() {
                return Err(SessionError::DocumentProcessing);
            }
            if inner.query_in_flight {
                return Err(SessionError::QueryInFlight);
            }
            let turn_id = match inner.timeline.append_user(text) {
                Some(id) => id,
                None => return Err(SessionError::EmptyQuestion),
            };
            inner.query_in_flight = true;
            debug!(session_id = %self.id, turn_id = turn_id.0, "Query dispatched");
            self.emit(SessionEvent::QueryDispatched {
                turn_id,
                timestamp: Timestamp::now(),
            });
            (inner.epoch, name, text.trim().to_string())
        };

        if !self.config.reply_delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.config.reply_delay) => {}
                _ = self.interrupt.notified() => {}
            }
            let inner = self.lock_inner()?;
            if inner.epoch != epoch {
                debug!(session_id = %self.id, "Query abandoned after reset");
                return Err(SessionError::Interrupted);
            }
        }

        let request = AskRequest {
            query,
            top_k: self.config.top_k,
            doc_id: doc_name.as_str().to_string(),
        };
        let answer = match self.backend.ask(request).await {
            Ok(answer) => answer,
            Err(err) => {
                let reason = match &err {
                    BackendError::Rejected { detail, .. } => detail.clone(),
                    other => other.to_string(),
                };
                let session_err = match err {
                    BackendError::Rejected { .. } => SessionError::QueryRejected(reason.clone()),
                    _ => SessionError::QueryTransport(reason.clone()),
                };
                let mut inner = self.lock_inner()?;
                if inner.epoch != epoch {
                    debug!(session_id = %self.id, "Query failure discarded after reset");
                    return Err(SessionError::Interrupted);
                }
                inner.query_in_flight = false;
                drop(inner);
                warn!(session_id = %self.id, %reason, "Query failed");
                self.emit(SessionEvent::QueryFailed {
                    reason,
                    timestamp: Timestamp::now(),
                });
                return Err(session_err);
            }
        };

        let reference_count = answer.retrieved_chunks.len();
        {
            let mut inner = self.lock_inner()?;
            if inner.epoch != epoch {
                debug!(session_id = %self.id, "Answer discarded after reset");
                return Err(SessionError::Interrupted);
            }
            if let Err(err) = inner.animator.begin(&answer.response) {
                inner.query_in_flight = false;
                error!(session_id = %self.id, %err, "Failed to start reveal");
                return Err(err);
            }
            if let Err(err) = inner
                .timeline
                .set_pending(answer.response.clone(), answer.retrieved_chunks)
            {
                inner.animator.cancel();
                inner.query_in_flight = false;
                error!(session_id = %self.id, %err, "Failed to stage answer");
                return Err(err);
            }
            self.publish_reveal(String::new());
        }
        self.emit(SessionEvent::AnswerReceived {
            reference_count,
            timestamp: Timestamp::now(),
        });

        let mut ticker = tokio::time::interval(self.config.reveal_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.interrupt.notified() => {}
            }
            let mut inner = self.lock_inner()?;
            if inner.epoch != epoch {
                debug!(session_id = %self.id, "Reveal abandoned after reset");
                return Err(SessionError::Interrupted);
            }
            let done = inner.animator.advance();
            let visible = inner.animator.visible().to_string();
            if !done {
                self.publish_reveal(visible);
                continue;
            }

            let turn_id = match inner.timeline.commit_pending() {
                Some(id) => id,
                None => {
                    inner.animator.cancel();
                    inner.query_in_flight = false;
                    error!(session_id = %self.id, "Reveal completed with no pending turn");
                    return Err(SessionError::Invariant(
                        "reveal completed with no pending turn".to_string(),
                    ));
                }
            };
            if let Err(err) = inner.animator.finish() {
                inner.query_in_flight = false;
                error!(session_id = %self.id, %err, "Reveal state corrupted");
                return Err(err);
            }
            inner.query_in_flight = false;
            let turn = inner.timeline.last().cloned();
            self.publish_reveal(visible);
            drop(inner);

            self.emit(SessionEvent::AnswerCommitted {
                turn_id,
                timestamp: Timestamp::now(),
            });
            info!(session_id = %self.id, turn_id = turn_id.0, "Answer committed");
            return turn.ok_or_else(|| {
                SessionError::Invariant("committed turn missing from timeline".to_string())
            });
        }
    }

    /// Tear the session down to its initial state.
    ///
    /// Never blocked by in-flight work: a running upload or query finds the
    /// epoch moved and discards its own result.
    pub fn reset(&self) {
        let (discarded_chars, discarded_turns) = {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(e) => {
                    error!(session_id = %self.id, "Session lock poisoned during reset: {}", e);
                    return;
                }
            };
            let discarded_chars = inner.animator.cancel();
            let discarded_turns = inner.timeline.clear();
            inner.document.reset();
            inner.query_in_flight = false;
            inner.epoch += 1;
            self.publish_reveal(String::new());
            (discarded_chars, discarded_turns)
        };

        self.interrupt.notify_waiters();
        if discarded_chars > 0 {
            self.emit(SessionEvent::RevealCancelled {
                discarded_chars,
                timestamp: Timestamp::now(),
            });
        }
        self.emit(SessionEvent::SessionReset {
            discarded_turns,
            timestamp: Timestamp::now(),
        });
        info!(session_id = %self.id, discarded_turns, "Session reset");
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// A document is loaded and no upload is running.
    pub fn is_ready(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.document.is_ready())
            .unwrap_or(false)
    }

    pub fn is_processing(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.document.is_processing())
            .unwrap_or(false)
    }

    pub fn document_name(&self) -> Option<DocumentName> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.document.name().cloned())
    }

    pub fn document_facts(&self) -> Option<DocumentFacts> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.document.facts().cloned())
    }

    pub fn last_upload_error(&self) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.document.last_error().map(str::to_string))
    }

    pub fn query_in_flight(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.query_in_flight)
            .unwrap_or(false)
    }

    /// Committed turns in conversation order.
    pub fn turns(&self) -> Vec<Turn> {
        self.inner
            .lock()
            .map(|inner| inner.timeline.turns().to_vec())
            .unwrap_or_default()
    }

    pub fn pending_turn(&self) -> Option<Turn> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.timeline.pending().cloned())
    }

    pub fn timeline_is_empty(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.timeline.is_empty())
            .unwrap_or(true)
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Watch the progressively revealed answer text.
    ///
    /// Carries the visible prefix of the answer in reveal; an empty string
    /// between answers and after a reset.
    pub fn reveal_feed(&self) -> watch::Receiver<String> {
        self.reveal_rx.clone()
    }

    // -- Private helpers --

    fn lock_inner(&self) -> Result<MutexGuard<'_, SessionInner>, SessionError> {
        self.inner
            .lock()
            .map_err(|e| SessionError::Invariant(format!("session lock poisoned: {}", e)))
    }

    fn emit(&self, event: SessionEvent) {
        debug!(session_id = %self.id, event = event.event_name(), "Session event");
        let _ = self.events.send(event);
    }

    /// Called with the session lock held; feed values follow state order.
    fn publish_reveal(&self, text: String) {
        let _ = self.reveal_tx.send(text);
    }
}

// =============================================================================
// Tests
// =============================================================================
