//! Error taxonomy of the harness.
//!
//! - [`LoadError`]: the plugin could not produce an agent. Fatal to that agent only.
//! - [`TrialError`]: one trial failed. Tallied, then the run moves on to the next word.
//! - [`RuleError`]: the rule engine received malformed input.

use std::path::PathBuf;

use crate::score::OutcomeKind;

/// Plugin discovery or contract violation.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The code unit does not exist.
    #[error("agent unit not found at {}", .0.display())]
    NotFound(PathBuf),

    /// The code unit exists but could not be read.
    #[error("could not read agent unit {}: {source}", .path.display())]
    Unreadable {
        /// Unit path.
        path: PathBuf,
        /// I/O cause.
        source: std::io::Error,
    },

    /// The manifest is malformed.
    #[error("line {line}: {reason}")]
    Manifest {
        /// 1-based line number.
        line: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// No declared implementation is a registered agent.
    #[error("agent unit {} defines no agent implementation", .0.display())]
    NoImplementation(PathBuf),

    /// More than one declared implementation is a registered agent.
    #[error("agent unit {} must define a single agent implementation, found {}", .path.display(), .found.join(", "))]
    MultipleImplementations {
        /// Unit path.
        path: PathBuf,
        /// Keys of the qualifying implementations.
        found: Vec<String>,
    },

    /// The implementation does not export a required capability.
    #[error("agent implementation '{implementation}' is missing capability '{capability}'")]
    MissingCapability {
        /// Registry key of the implementation.
        implementation: String,
        /// Name of the first missing capability.
        capability: String,
    },

    /// The implementation's constructor failed.
    #[error("could not construct agent '{implementation}': {source:#}")]
    Construction {
        /// Registry key of the implementation.
        implementation: String,
        /// Constructor error.
        source: anyhow::Error,
    },
}

/// Why a single trial did not reach a gameplay outcome.
#[derive(Debug, thiserror::Error)]
pub enum TrialError {
    /// The agent failed or timed out while producing a hint.
    #[error("failed to generate hint for word '{word}': {source:#}")]
    Agent {
        /// Target word of the trial.
        word: String,
        /// Cause, including timeouts.
        source: anyhow::Error,
    },

    /// The guesser failed while producing a guess.
    #[error("guess generation failed for hint '{hint}': {source:#}")]
    Guesser {
        /// Hint that was being guessed.
        hint: String,
        /// Cause.
        source: anyhow::Error,
    },

    /// Any other failure during the trial.
    #[error("uncaught error: {0:#}")]
    Uncaught(anyhow::Error),
}

impl TrialError {
    /// Tally category of this error.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            TrialError::Agent { .. } => OutcomeKind::AgentError,
            TrialError::Guesser { .. } => OutcomeKind::GuesserError,
            TrialError::Uncaught(_) => OutcomeKind::UncaughtError,
        }
    }
}

/// Malformed input to the rule engine. A contract error, not a gameplay outcome.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The hint or guess could not be checked.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
