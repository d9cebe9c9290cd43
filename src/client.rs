use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Shown when the service replied but carried neither an answer nor an error.
pub const GENERIC_REPLY: &str = "Something went wrong";

/// Shown when the request never completed.
pub const FALLBACK_REPLY: &str = "⚠️ Failed to fetch answer.";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

#[derive(Debug, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
}

/// Body returned by `POST /ask`. Both fields are optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AskResponse {
    pub answer: Option<String>,
    pub error: Option<String>,
}

impl AskResponse {
    pub fn answered(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            answer: None,
            error: Some(error.into()),
        }
    }

    /// Present and non-empty, like the error below.
    pub fn answer_text(&self) -> Option<&str> {
        self.answer.as_deref().filter(|a| !a.is_empty())
    }

    pub fn error_text(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// Why a request never produced a usable body
#[derive(Debug, Error)]
pub enum AskError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("answer service returned status {0}")]
    Status(StatusCode),
}

/// Anything that can turn a question into an [`AskResponse`].
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, question: &str) -> Result<AskResponse, AskError>;
}

#[derive(Clone)]
pub struct AnswerClient {
    client: Client,
    base_url: String,
}

impl AnswerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn ask_url(&self) -> String {
        format!("{}/ask", self.base_url)
    }
}

#[async_trait]
impl AnswerService for AnswerClient {
    async fn ask(&self, question: &str) -> Result<AskResponse, AskError> {
        let url = self.ask_url();
        let transport = |source| AskError::Transport {
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .post(&url)
            .json(&AskRequest { question })
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(AskError::Status(response.status()));
        }

        let body = response.text().await.map_err(transport)?;
        Ok(parse_body(&body))
    }
}

/// A successful status with an unexpected body is not a transport failure;
/// it maps to an empty response and so to the generic reply. Each field is
/// taken only when it is a string, so one odd field does not hide the other.
fn parse_body(body: &str) -> AskResponse {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "answer service returned an unrecognised body");
            return AskResponse::default();
        }
    };
    if !value.is_object() {
        tracing::warn!("answer service returned a body that is not a JSON object");
    }

    let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
    AskResponse {
        answer: field("answer"),
        error: field("error"),
    }
}
