use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use super::{check_prompt, Reply, ServiceError, TextGenerator};

type Responder = dyn Fn(&str) -> Reply + Send + Sync;
type Embedder = dyn Fn(&str) -> Vec<f32> + Send + Sync;

/// Deterministic in-process service answering from closures, for tests and offline runs.
///
/// It enforces the same prompt length limit as a real service.
pub struct ScriptedGenerator {
    respond: Box<Responder>,
    embed: Option<Box<Embedder>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    /// Answers every prompt with `respond(prompt)`.
    pub fn new(respond: impl Fn(&str) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            embed: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Embeds texts with `embed(text)`. Without it, embedding fails.
    pub fn with_embeddings(
        mut self,
        embed: impl Fn(&str) -> Vec<f32> + Send + Sync + 'static,
    ) -> Self {
        self.embed = Some(Box::new(embed));
        self
    }

    /// Number of accepted completion requests.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> Result<Reply, ServiceError> {
        check_prompt(prompt)?;
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok((self.respond)(prompt))
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        match &self.embed {
            Some(embed) => Ok(embed(text)),
            None => Err(ServiceError::Embedding("no embeddings scripted".to_owned())),
        }
    }
}

impl fmt::Debug for ScriptedGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedGenerator")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}
