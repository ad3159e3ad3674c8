//! The guesser: turns a hint into a guess through the text-generation service.

use std::sync::Arc;

use tracing::warn;

use crate::llm::{Reply, ServiceError, TextGenerator};

/// Guesses the word a hint describes.
pub struct Guesser {
    llm: Arc<dyn TextGenerator>,
}

impl Guesser {
    /// A guesser using its own service handle.
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// The prompt sent for `hint`.
    pub fn prompt(hint: &str) -> String {
        format!(
            "Guess a single word based on the hint: {hint}. Respond only with the guess. Don't use punctuation or articles"
        )
    }

    /// The guess for `hint`, trimmed and lowercased.
    ///
    /// A service-side failure yields its sentinel code as the guess, which is never correct.
    pub fn guess(&self, hint: &str) -> Result<String, ServiceError> {
        let reply = self.llm.generate(&Self::prompt(hint))?;
        if let Reply::Failed(failure) = &reply {
            warn!(hint, "guesser got a service failure: {failure}");
        }
        Ok(reply.into_text().trim().to_lowercase())
    }
}
