use std::time::Duration;

use anyhow::Context;
use reqwest::{blocking::Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{instrument, warn};

use super::{check_prompt, Reply, ServiceError, ServiceFailure, TextGenerator};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const API_KEY_ENV: &str = "OPENAI_API_KEY";
const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
const EMBEDDING_MODEL: &str = "text-embedding-3-large";
const MAX_COMPLETION_TOKENS: u32 = 300;
const SYSTEM_PROMPT: &str = "You are an assistant playing Taboo, the word game. You may be asked \
    either to give creative hints that let your team guess a target word without ever using \
    the forbidden words, or to interpret a hint and guess the hidden word.";

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// Blocking client for an OpenAI-compatible chat completion and embedding API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Creates a client for `model`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Creates a client from `OPENAI_API_KEY` and, if set, `OPENAI_BASE_URL`.
    pub fn from_env(model: impl Into<String>) -> anyhow::Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).with_context(|| format!("missing {API_KEY_ENV}"))?;
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        Self::new(base_url, api_key, model)
    }

    fn post(&self, path: &str, body: &Value) -> reqwest::Result<reqwest::blocking::Response> {
        self.client
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
    }
}

impl TextGenerator for OpenAiClient {
    #[instrument(skip(self), fields(model = %self.model))]
    fn generate(&self, prompt: &str) -> Result<Reply, ServiceError> {
        check_prompt(prompt)?;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "response_format": { "type": "text" },
            "max_completion_tokens": MAX_COMPLETION_TOKENS,
        });

        let response = match self.post("chat/completions", &body) {
            Ok(response) => response,
            Err(e) => {
                warn!("unable to reach the text-generation service: {e}");
                return Ok(Reply::Failed(ServiceFailure::Connection));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            let failure = classify_failure(status, &text);
            warn!(%status, "completion failed: {failure}");
            return Ok(Reply::Failed(failure));
        }

        match response.json::<ChatResponse>() {
            Ok(chat) => Ok(chat
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .map_or(Reply::Failed(ServiceFailure::Other), Reply::Text)),
            Err(e) => {
                warn!("unexpected completion payload: {e}");
                Ok(Reply::Failed(ServiceFailure::Other))
            }
        }
    }

    #[instrument(skip(self))]
    fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        let body = json!({ "model": EMBEDDING_MODEL, "input": text });
        let response = self
            .post("embeddings", &body)
            .map_err(|e| ServiceError::Embedding(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Embedding(format!("service answered {status}")));
        }
        let payload = response
            .json::<EmbeddingResponse>()
            .map_err(|e| ServiceError::Embedding(e.to_string()))?;
        payload
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ServiceError::Embedding("empty embedding payload".to_owned()))
    }
}

fn classify_failure(status: StatusCode, body: &str) -> ServiceFailure {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ServiceFailure::RateLimit,
        StatusCode::BAD_REQUEST if is_content_filter(body) => ServiceFailure::ContentFilter,
        status => ServiceFailure::Api(status.as_u16()),
    }
}

fn is_content_filter(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["code"].as_str().map(|code| code == "content_filter"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_status_codes() {
        let filtered = r#"{"error": {"code": "content_filter", "message": "nope"}}"#;
        assert_eq!(
            classify_failure(StatusCode::BAD_REQUEST, filtered),
            ServiceFailure::ContentFilter
        );
        assert_eq!(
            classify_failure(StatusCode::BAD_REQUEST, "not json"),
            ServiceFailure::Api(400)
        );
        assert_eq!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, ""),
            ServiceFailure::RateLimit
        );
        assert_eq!(
            classify_failure(StatusCode::INTERNAL_SERVER_ERROR, ""),
            ServiceFailure::Api(500)
        );
    }

    #[test]
    fn rejects_long_prompt_before_any_request() {
        let client = OpenAiClient::new("http://127.0.0.1:9", "key", "gpt-4o-mini").unwrap();
        let err = client.generate(&"x".repeat(500)).unwrap_err();
        assert!(matches!(err, ServiceError::PromptTooLong { len: 500, max: 450 }));
    }
}
