//! Text-generation service contract.
//!
//! The service fails closed: transport and API failures come back as a
//! [`Reply::Failed`] value carrying a sentinel code, never as an error, so callers can branch
//! on the outcome. Only contract violations (e.g. a prompt longer than [`MAX_PROMPT_CHARS`])
//! are reported as [`ServiceError`]s.

use std::{borrow::Cow, fmt, sync::Arc};

mod openai;
mod scripted;

pub use openai::OpenAiClient;
pub use scripted::ScriptedGenerator;

/// Longest prompt, in characters, the service accepts.
pub const MAX_PROMPT_CHARS: usize = 450;

/// The external text-generation and embedding service.
///
/// Each agent, and each guesser, owns its own handle.
pub trait TextGenerator: Send + Sync {
    /// Completes `prompt`.
    fn generate(&self, prompt: &str) -> Result<Reply, ServiceError>;

    /// Embeds `text` into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError>;
}

/// Opens a new service handle for the named model.
///
/// Called once per agent and once per guesser, so that no two of them share a handle.
pub type GeneratorFactory =
    Arc<dyn Fn(&str) -> anyhow::Result<Arc<dyn TextGenerator>> + Send + Sync>;

/// Rejects prompts over [`MAX_PROMPT_CHARS`].
pub fn check_prompt(prompt: &str) -> Result<(), ServiceError> {
    let len = prompt.chars().count();
    if len > MAX_PROMPT_CHARS {
        return Err(ServiceError::PromptTooLong {
            len,
            max: MAX_PROMPT_CHARS,
        });
    }
    Ok(())
}

/// Outcome of a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Generated text.
    Text(String),
    /// The request failed on the service side.
    Failed(ServiceFailure),
}

impl Reply {
    /// The generated text, or the sentinel code of the failure.
    pub fn into_text(self) -> String {
        match self {
            Reply::Text(text) => text,
            Reply::Failed(failure) => failure.code().into_owned(),
        }
    }
}

/// Service-side failure, identified by a sentinel code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceFailure {
    /// The service could not be reached.
    Connection,
    /// Too many requests.
    RateLimit,
    /// The prompt triggered the content filter.
    ContentFilter,
    /// Any other HTTP status.
    Api(u16),
    /// Unexpected failure.
    Other,
}

impl ServiceFailure {
    /// The sentinel code callers match on.
    pub fn code(&self) -> Cow<'static, str> {
        match self {
            ServiceFailure::Connection => "API_CONNECTION_ERROR".into(),
            ServiceFailure::RateLimit => "RATE_LIMIT_ERROR".into(),
            ServiceFailure::ContentFilter => "CONTENT_FILTER_ERROR".into(),
            ServiceFailure::Api(status) => format!("API_ERROR_{status}").into(),
            ServiceFailure::Other => "OPENAI_ERROR".into(),
        }
    }
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

/// Contract violations of the service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The prompt is over [`MAX_PROMPT_CHARS`].
    #[error("prompt is too long ({len} characters), maximum length is {max} characters")]
    PromptTooLong {
        /// Prompt length in characters.
        len: usize,
        /// Accepted maximum.
        max: usize,
    },

    /// No embedding could be produced.
    #[error("embedding failed: {0}")]
    Embedding(String),
}
