//! The capability contract every agent implements.

use std::{fmt, str::FromStr, sync::Arc};

use anyhow::bail;

use crate::{challenge::EmbeddingStore, level::Level, llm::TextGenerator, timeout::CancelToken};

/// A pluggable hint producer under evaluation.
///
/// One instance is built per evaluation run and is used by a single evaluator, never shared
/// between runs. Hint generation runs on a guard thread and may be abandoned when it exceeds
/// its deadline: long computations should poll [`HintRequest::cancel`] and return early.
pub trait Agent: Send {
    /// Display name used in reports.
    fn name(&self) -> String;

    /// Produces a hint for `request.target` that respects the rules of `request.level`.
    fn hint(&mut self, request: &HintRequest<'_>) -> anyhow::Result<String>;

    /// The `k` precomputed hints closest to `query`.
    fn similarity_search(&mut self, query: &str, k: usize) -> anyhow::Result<Vec<String>>;
}

/// Everything an agent receives to produce one hint.
#[derive(Debug, Clone, Copy)]
pub struct HintRequest<'a> {
    /// Words the hint must not reveal.
    pub taboo: &'a [String],
    /// Word the guesser should find.
    pub target: &'a str,
    /// Level whose rules apply.
    pub level: Level,
    /// Raised when the caller stopped waiting for this hint.
    pub cancel: &'a CancelToken,
}

/// Resources handed to an agent at construction.
#[derive(Clone)]
pub struct AgentContext {
    /// The agent's own text-generation handle.
    pub llm: Arc<dyn TextGenerator>,
    /// Precomputed hint embeddings, shared read-only.
    pub hints_db: Arc<EmbeddingStore>,
}

impl fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentContext")
            .field("hints_db", &self.hints_db.len())
            .finish_non_exhaustive()
    }
}

/// One entry of the agent capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// [`Agent::name`].
    Name,
    /// [`Agent::hint`].
    Hint,
    /// [`Agent::similarity_search`].
    SimilaritySearch,
}

impl Capability {
    /// The capabilities a code unit must export.
    pub const REQUIRED: [Capability; 3] = [
        Capability::Name,
        Capability::Hint,
        Capability::SimilaritySearch,
    ];

    /// Name used in manifests.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Name => "name",
            Capability::Hint => "hint",
            Capability::SimilaritySearch => "similarity_search",
        }
    }
}

impl FromStr for Capability {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "name" => Ok(Capability::Name),
            "hint" => Ok(Capability::Hint),
            "similarity_search" => Ok(Capability::SimilaritySearch),
            _ => bail!("unknown capability '{s}'"),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
