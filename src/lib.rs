//! # Taboo Eval
//!
//! A harness evaluating third-party hint agents on a Taboo-like word-guessing challenge.
//!
//! An agent receives a target word and its taboo words, and must produce a hint from which a
//! language-model guesser finds the target. Four levels impose different rules on hints and
//! guesses (see [`rules`]).
//!
//! It provides:
//! - Agent loading from code units and a load-time
//!   [`AgentRegistry`](crate::registry::AgentRegistry)
//! - Hint and guess validation per level
//! - Timeout-guarded trials whose failures are classified by origin
//! - Weighted scoring, and parallel evaluation of many agents into a ranked table
//!
//! # Documentation Overview
//!
//! - For the agent contract, see the [`Agent`](crate::agent::Agent) trait.
//! - For the code unit format and its checks, see [`agent_collector`].
//! - For running a whole directory of agents, see the [`orchestrator`] module.
//! - For configuring the run, see [`Configuration`](crate::configuration::Configuration).
//!
//! # Usage Example
//!
//! ```no_run
//! use std::{path::Path, sync::Arc};
//!
//! use taboo_eval::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Configuration::from_env().with_verbose(false);
//!     let dataset = Dataset::load(
//!         Path::new("data/words_with_taboo.txt"),
//!         Path::new("data/level3_data/hints.txt"),
//!         Path::new("data/translations/it_fr.json"),
//!         Path::new("data/level3_data/hints_db.json"),
//!     )?;
//!
//!     // each agent and each guesser gets its own client
//!     let services: GeneratorFactory =
//!         Arc::new(|model: &str| -> anyhow::Result<Arc<dyn TextGenerator>> {
//!             Ok(Arc::new(OpenAiClient::from_env(model)?))
//!         });
//!
//!     let orchestrator = Orchestrator::new(
//!         config,
//!         Arc::new(AgentRegistry::with_builtins()),
//!         Arc::new(dataset),
//!         services,
//!     )?;
//!     let ranking = orchestrator.evaluate("agents")?;
//!     println!("{ranking}");
//!     Ok(())
//! }
//! ```
//!
//! # Example Agent
//!
//! ```
//! use taboo_eval::prelude::*;
//!
//! struct Echo;
//!
//! impl Agent for Echo {
//!     fn name(&self) -> String {
//!         "echo".to_owned()
//!     }
//!
//!     fn hint(&mut self, request: &HintRequest<'_>) -> anyhow::Result<String> {
//!         Ok(format!("not {}", request.taboo.join(" nor ")))
//!     }
//!
//!     fn similarity_search(&mut self, _query: &str, _k: usize) -> anyhow::Result<Vec<String>> {
//!         Ok(vec![])
//!     }
//! }
//!
//! let mut registry = AgentRegistry::with_builtins();
//! registry.register("echo", |_ctx| Ok(Echo));
//! ```
//!
//! with the code unit `agents/echo.yaml`:
//!
//! ```yaml
//! implementations:
//!   - echo: "name hint similarity_search"
//! ```
#![warn(missing_docs)]

pub use anyhow;
pub mod agent;
pub mod agent_collector;
pub mod agents;
pub mod challenge;
pub mod configuration;
pub mod errors;
pub mod evaluator;
pub mod guesser;
pub mod level;
pub mod llm;
mod logger;
pub mod orchestrator;
pub mod progress;
pub mod registry;
pub mod report;
pub mod rules;
mod scheduler;
pub mod score;
pub mod suite;
pub mod timeout;

/// Commonly used types and traits for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use taboo_eval::prelude::*;
/// ```
pub mod prelude {
    pub use crate::agent::{Agent, AgentContext, HintRequest};
    pub use crate::challenge::{ChallengeWord, Dataset};
    pub use crate::configuration::Configuration;
    pub use crate::level::Level;
    pub use crate::llm::{GeneratorFactory, OpenAiClient, Reply, TextGenerator};
    pub use crate::orchestrator::Orchestrator;
    pub use crate::registry::AgentRegistry;
    pub use crate::report::Ranking;
}
