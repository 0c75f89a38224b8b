//! Scripted in-memory backend for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::BackendError;
use crate::{Answer, AskRequest, DocumentPayload, RetrievalBackend, UploadAck};

/// In-memory stand-in for the retrieval service.
///
/// Replies with a fixed default unless results have been scripted with the
/// `push_*` methods; scripted results are consumed in order. A gated mock
/// blocks each call until the paired [`Notify`] fires, so tests can observe
/// in-flight state deterministically.
pub struct MockBackend {
    upload_results: Mutex<VecDeque<Result<UploadAck, BackendError>>>,
    answer_results: Mutex<VecDeque<Result<Answer, BackendError>>>,
    default_answer: Answer,
    default_error: Option<BackendError>,
    uploads: Mutex<Vec<String>>,
    questions: Mutex<Vec<AskRequest>>,
    gate: Option<Arc<Notify>>,
}

impl MockBackend {
    /// A mock that accepts every upload and answers every question.
    pub fn new() -> Self {
        Self {
            upload_results: Mutex::new(VecDeque::new()),
            answer_results: Mutex::new(VecDeque::new()),
            default_answer: Answer {
                response: "This is a mock answer.".to_string(),
                retrieved_chunks: Vec::new(),
            },
            default_error: None,
            uploads: Mutex::new(Vec::new()),
            questions: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// A mock whose default answer is the given text.
    pub fn with_answer(text: &str) -> Self {
        Self::with_answer_and_chunks(text, Vec::new())
    }

    /// A mock whose default answer carries the given retrieved chunks.
    pub fn with_answer_and_chunks(text: &str, chunks: Vec<String>) -> Self {
        let mut mock = Self::new();
        mock.default_answer = Answer {
            response: text.to_string(),
            retrieved_chunks: chunks,
        };
        mock
    }

    /// A mock that rejects every call with the given status and detail.
    pub fn rejecting(status: u16, detail: &str) -> Self {
        let mut mock = Self::new();
        mock.default_error = Some(BackendError::Rejected {
            status,
            detail: detail.to_string(),
        });
        mock
    }

    /// A mock whose every call fails at the transport level.
    pub fn failing_transport(detail: &str) -> Self {
        let mut mock = Self::new();
        mock.default_error = Some(BackendError::Transport(detail.to_string()));
        mock
    }

    /// Gate every call on a [`Notify`]; returns the mock and its release handle.
    ///
    /// Each `notify_one` releases one blocked call.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Script the result for the next unscripted upload.
    pub fn push_upload_result(&self, result: Result<UploadAck, BackendError>) {
        self.upload_results
            .lock()
            .expect("mock lock poisoned")
            .push_back(result);
    }

    /// Script the answer for the next unscripted question.
    pub fn push_answer(&self, answer: Answer) {
        self.answer_results
            .lock()
            .expect("mock lock poisoned")
            .push_back(Ok(answer));
    }

    /// Script a failure for the next unscripted question.
    pub fn push_ask_error(&self, error: BackendError) {
        self.answer_results
            .lock()
            .expect("mock lock poisoned")
            .push_back(Err(error));
    }

    /// Number of uploads received so far.
    pub fn upload_count(&self) -> usize {
        self.uploads.lock().expect("mock lock poisoned").len()
    }

    /// File names of uploads received so far.
    pub fn uploaded_file_names(&self) -> Vec<String> {
        self.uploads.lock().expect("mock lock poisoned").clone()
    }

    /// Number of questions received so far.
    pub fn question_count(&self) -> usize {
        self.questions.lock().expect("mock lock poisoned").len()
    }

    /// Questions received so far.
    pub fn questions(&self) -> Vec<AskRequest> {
        self.questions.lock().expect("mock lock poisoned").clone()
    }

    fn default_ack(file_name: &str) -> UploadAck {
        UploadAck {
            message: "File processed successfully".to_string(),
            file_name: Some(file_name.to_string()),
            num_chunks: Some(1),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RetrievalBackend for MockBackend {
    async fn submit_document(&self, payload: DocumentPayload) -> Result<UploadAck, BackendError> {
        self.uploads
            .lock()
            .expect("mock lock poisoned")
            .push(payload.file_name.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let scripted = self
            .upload_results
            .lock()
            .expect("mock lock poisoned")
            .pop_front();
        match scripted {
            Some(result) => result,
            None => match &self.default_error {
                Some(err) => Err(err.clone()),
                None => Ok(Self::default_ack(&payload.file_name)),
            },
        }
    }

    async fn ask(&self, request: AskRequest) -> Result<Answer, BackendError> {
        self.questions
            .lock()
            .expect("mock lock poisoned")
            .push(request);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let scripted = self
            .answer_results
            .lock()
            .expect("mock lock poisoned")
            .pop_front();
        match scripted {
            Some(result) => result,
            None => match &self.default_error {
                Some(err) => Err(err.clone()),
                None => Ok(self.default_answer.clone()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn payload() -> DocumentPayload {
        DocumentPayload::new("report.pdf", "application/pdf", vec![1, 2, 3])
    }

    fn ask_request(query: &str) -> AskRequest {
        AskRequest {
            query: query.to_string(),
            top_k: 5,
            doc_id: "report.pdf".to_string(),
        }
    }

    #[tokio::test]
    async fn test_default_upload_echoes_file_name() {
        let mock = MockBackend::new();
        let ack = mock.submit_document(payload()).await.unwrap();
        assert_eq!(ack.file_name.as_deref(), Some("report.pdf"));
        assert_eq!(mock.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_default_answer() {
        let mock = MockBackend::with_answer("The answer is 42.");
        let answer = mock.ask(ask_request("what?")).await.unwrap();
        assert_eq!(answer.response, "The answer is 42.");
        assert_eq!(mock.question_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_answers_consumed_in_order() {
        let mock = MockBackend::new();
        mock.push_answer(Answer {
            response: "first".to_string(),
            retrieved_chunks: Vec::new(),
        });
        mock.push_ask_error(BackendError::Transport("gone".to_string()));

        assert_eq!(mock.ask(ask_request("a")).await.unwrap().response, "first");
        assert!(mock.ask(ask_request("b")).await.is_err());
        // queue exhausted, falls back to the default
        assert_eq!(
            mock.ask(ask_request("c")).await.unwrap().response,
            "This is a mock answer."
        );
    }

    #[tokio::test]
    async fn test_rejecting_mock() {
        let mock = MockBackend::rejecting(503, "index unavailable");
        let err = mock.ask(ask_request("q")).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 503, .. }));
        let err = mock.submit_document(payload()).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_failing_transport_mock() {
        let mock = MockBackend::failing_transport("connection refused");
        let err = mock.submit_document(payload()).await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
        let err = mock.ask(ask_request("q")).await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }

    #[tokio::test]
    async fn test_gated_mock_blocks_until_released() {
        let (mock, gate) = MockBackend::new().gated();
        let mock = Arc::new(mock);

        let task = tokio::spawn({
            let mock = Arc::clone(&mock);
            async move { mock.ask(ask_request("slow")).await }
        });

        // the call is recorded before it blocks on the gate
        tokio::time::timeout(Duration::from_secs(2), async {
            while mock.question_count() == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert!(!task.is_finished());

        gate.notify_one();
        let answer = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(answer.response, "This is a mock answer.");
    }

    #[tokio::test]
    async fn test_questions_record_request_shape() {
        let mock = MockBackend::new();
        mock.ask(ask_request("what is this?")).await.unwrap();
        let questions = mock.questions();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].query, "what is this?");
        assert_eq!(questions[0].top_k, 5);
    }
}
