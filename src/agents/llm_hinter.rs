use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::debug;

use crate::{
    agent::{Agent, AgentContext, HintRequest},
    challenge::EmbeddingStore,
    level::Level,
    llm::{Reply, TextGenerator},
};

const MAX_WORDS: usize = 5;
const MAX_WORD_CHARS: usize = 20;

/// Asks the text-generation service for a short description of the target word.
///
/// At level 3 it instead picks the precomputed hint whose embedding is closest to the
/// target word's.
pub struct LlmHinter {
    llm: Arc<dyn TextGenerator>,
    hints_db: Arc<EmbeddingStore>,
}

impl LlmHinter {
    /// Registry key.
    pub const KEY: &'static str = "llm_hinter";

    /// Creates the agent from its context.
    pub fn new(ctx: AgentContext) -> Self {
        Self {
            llm: ctx.llm,
            hints_db: ctx.hints_db,
        }
    }

    fn describe(&self, request: &HintRequest<'_>) -> anyhow::Result<String> {
        let prompt = format!(
            "Describe the word '{}' in at most five words, without using any of these words: {}. Reply with the description only.",
            request.target,
            request.taboo.join(", ")
        );
        match self.llm.generate(&prompt)? {
            Reply::Text(text) => Ok(text.trim().trim_matches('"').to_owned()),
            Reply::Failed(failure) => bail!("text-generation service failed: {failure}"),
        }
    }
}

impl Agent for LlmHinter {
    fn name(&self) -> String {
        Self::KEY.to_owned()
    }

    fn hint(&mut self, request: &HintRequest<'_>) -> anyhow::Result<String> {
        if request.level == Level::Three {
            return self
                .similarity_search(request.target, 1)?
                .into_iter()
                .next()
                .context("no precomputed hint available");
        }

        let description = self.describe(request)?;
        if request.cancel.is_cancelled() {
            bail!("cancelled");
        }
        debug!(target_word = request.target, %description);

        if request.level == Level::Four {
            return Ok(description
                .split_whitespace()
                .filter(|w| w.chars().count() <= MAX_WORD_CHARS)
                .take(MAX_WORDS)
                .collect::<Vec<_>>()
                .join(" "));
        }
        Ok(description)
    }

    fn similarity_search(&mut self, query: &str, k: usize) -> anyhow::Result<Vec<String>> {
        let embedding = self.llm.embed(query)?;
        Ok(self.hints_db.nearest(&embedding, k))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        llm::{ScriptedGenerator, ServiceFailure},
        timeout::CancelToken,
    };

    fn hinter(generator: ScriptedGenerator) -> LlmHinter {
        let store = EmbeddingStore::from(HashMap::from([
            ("lavora in corsia".to_owned(), vec![1.0, 0.0]),
            ("sforna il pane".to_owned(), vec![0.0, 1.0]),
        ]));
        LlmHinter::new(AgentContext {
            llm: Arc::new(generator),
            hints_db: Arc::new(store),
        })
    }

    fn request<'a>(level: Level, taboo: &'a [String], cancel: &'a CancelToken) -> HintRequest<'a> {
        HintRequest {
            taboo,
            target: "medico",
            level,
            cancel,
        }
    }

    #[test]
    fn level_four_keeps_five_short_words() {
        let mut agent = hinter(ScriptedGenerator::new(|_| {
            let reply =
                "\"cura i pazienti ammalati sempreeeeeeeeeeeeeeeeeee con pazienza e amore\"";
            Reply::Text(reply.into())
        }));
        let cancel = CancelToken::new();
        let hint = agent.hint(&request(Level::Four, &[], &cancel)).unwrap();
        assert_eq!(hint, "cura i pazienti ammalati con");
    }

    #[test]
    fn level_three_uses_similarity_search() {
        let mut agent = hinter(
            ScriptedGenerator::new(|_| Reply::Text("unused".into()))
                .with_embeddings(|text| {
                    if text == "medico" {
                        vec![0.9, 0.1]
                    } else {
                        vec![0.0, 1.0]
                    }
                }),
        );
        let cancel = CancelToken::new();
        let hint = agent.hint(&request(Level::Three, &[], &cancel)).unwrap();
        assert_eq!(hint, "lavora in corsia");
        assert_eq!(agent.similarity_search("pane", 2).unwrap()[0], "sforna il pane");
    }

    #[test]
    fn service_failure_is_an_agent_error() {
        let mut agent = hinter(ScriptedGenerator::new(|_| {
            Reply::Failed(ServiceFailure::RateLimit)
        }));
        let cancel = CancelToken::new();
        let taboo = vec!["ospedale".to_owned()];
        let err = agent.hint(&request(Level::One, &taboo, &cancel)).unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_ERROR"));
    }
}
