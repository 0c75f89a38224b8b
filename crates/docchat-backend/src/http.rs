//! HTTP client for the retrieval backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use docchat_core::config::BackendConfig;

use crate::error::BackendError;
use crate::{Answer, AskRequest, DocumentPayload, RetrievalBackend, UploadAck};

/// Error body returned by the backend on rejection.
#[derive(Debug, Deserialize)]
struct ErrorReply {
    #[serde(default)]
    detail: String,
}

/// Client for the document QA service's HTTP API.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client from backend configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Decode a response, mapping non-2xx statuses to `Rejected`.
    async fn read_reply<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<ErrorReply>().await {
                Ok(reply) if !reply.detail.is_empty() => reply.detail,
                _ => format!("HTTP {}", status.as_u16()),
            };
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl RetrievalBackend for HttpBackend {
    async fn submit_document(&self, payload: DocumentPayload) -> Result<UploadAck, BackendError> {
        let url = self.endpoint("upload");
        debug!(
            url = %url,
            file_name = %payload.file_name,
            size_bytes = payload.bytes.len(),
            "Submitting document"
        );
        let part = multipart::Part::bytes(payload.bytes)
            .file_name(payload.file_name)
            .mime_str(&payload.content_type)
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::read_reply(response).await
    }

    async fn ask(&self, request: AskRequest) -> Result<Answer, BackendError> {
        let url = self.endpoint("query");
        debug!(url = %url, top_k = request.top_k, "Sending query");
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::read_reply(response).await
    }
}
