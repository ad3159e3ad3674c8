//! One trial: a hint from the agent, checked, then guessed and checked.
//!
//! ```text
//! RequestHint --timeout / agent failure--> AgentError
//!      |
//! ValidateHint --rule violation--> BadHint (incorrect)
//!      |
//! RequestGuess --guesser failure--> GuesserError
//!      |
//! ValidateGuess --> Success (correct) | BadGuess (incorrect)
//! ```

use std::{
    sync::{Arc, Mutex, MutexGuard, TryLockError},
    thread,
    time::Duration,
};

use anyhow::anyhow;
use tracing::{instrument, trace};

use crate::{
    agent::{Agent, HintRequest},
    challenge::ChallengeWord,
    errors::TrialError,
    guesser::Guesser,
    level::Level,
    progress::Reporter,
    rules::RuleBook,
    score::OutcomeKind,
    timeout::{CancelToken, TimeoutGuard},
};

/// The agent under test, locked by whichever thread is currently asking it for a hint.
pub type SharedAgent = Arc<Mutex<Box<dyn Agent>>>;

const LOCK_RETRY: Duration = Duration::from_millis(5);

/// Gameplay result of a trial that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Valid hint, correct guess.
    Success {
        /// The hint.
        hint: String,
        /// The guess.
        guess: String,
    },
    /// The hint broke the level's rules.
    BadHint {
        /// The hint.
        hint: String,
    },
    /// Valid hint, wrong guess.
    BadGuess {
        /// The hint.
        hint: String,
        /// The guess.
        guess: String,
    },
}

impl TrialOutcome {
    /// Tally category of the outcome.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            TrialOutcome::Success { .. } => OutcomeKind::Correct,
            TrialOutcome::BadHint { .. } | TrialOutcome::BadGuess { .. } => OutcomeKind::Incorrect,
        }
    }
}

/// Runs trials of one agent against one guesser.
pub struct SampleEvaluator<'a> {
    agent: SharedAgent,
    guesser: &'a Guesser,
    rules: &'a RuleBook,
    guard: TimeoutGuard,
    reporter: &'a Reporter,
}

impl<'a> SampleEvaluator<'a> {
    /// Creates an evaluator. Each hint request gets `guard`'s deadline.
    pub fn new(
        agent: SharedAgent,
        guesser: &'a Guesser,
        rules: &'a RuleBook,
        guard: TimeoutGuard,
        reporter: &'a Reporter,
    ) -> Self {
        Self {
            agent,
            guesser,
            rules,
            guard,
            reporter,
        }
    }

    /// Plays `word` at `level`.
    #[instrument(skip(self, word), fields(word = %word.target))]
    pub fn evaluate(&self, word: &ChallengeWord, level: Level) -> Result<TrialOutcome, TrialError> {
        let target = &word.target;
        self.reporter.message(format!(
            "Lvl{level} - Current guess word - taboo: {target} - {:?}",
            word.taboo
        ));

        let hint = self.request_hint(word, level)?;
        trace!(%hint);

        let valid = self
            .rules
            .check_hint(word, &hint, level)
            .map_err(|e| TrialError::Uncaught(e.into()))?;
        if !valid {
            self.reporter
                .message(format!("Bad Hint lvl{level}: {target} - Hint: {hint}"));
            return Ok(TrialOutcome::BadHint { hint });
        }

        let guess = match self.guesser.guess(&hint) {
            Ok(guess) => guess,
            Err(e) => {
                return Err(TrialError::Guesser {
                    hint,
                    source: e.into(),
                })
            }
        };

        if self.rules.check_guess(word, &guess, level) {
            self.reporter.message(format!(
                "Lvl{level} - Target: {target} - Hint: {hint} - Guess: {guess}\n"
            ));
            Ok(TrialOutcome::Success { hint, guess })
        } else {
            self.reporter.message(format!(
                "Bad Guess! Lvl{level} - Target {target} - Hint: {hint} - Guess: {guess}\n"
            ));
            Ok(TrialOutcome::BadGuess { hint, guess })
        }
    }

    fn request_hint(&self, word: &ChallengeWord, level: Level) -> Result<String, TrialError> {
        let agent = Arc::clone(&self.agent);
        let taboo = word.taboo.clone();
        let target = word.target.clone();

        let result = self.guard.run("hint-worker", move |cancel| {
            let Some(mut agent) = lock_agent(&agent, cancel) else {
                return Err(anyhow!("agent is still busy with an abandoned request"));
            };
            agent.hint(&HintRequest {
                taboo: &taboo,
                target: &target,
                level,
                cancel,
            })
        });

        let source = match result {
            Ok(Ok(hint)) => return Ok(hint),
            Ok(Err(e)) => e,
            Err(e) => anyhow::Error::new(e),
        };
        Err(TrialError::Agent {
            word: word.target.clone(),
            source,
        })
    }
}

/// Waits for an abandoned hint request to release the agent, until `cancel` is raised.
///
/// A poisoned lock is taken over.
fn lock_agent<'a>(
    agent: &'a Mutex<Box<dyn Agent>>,
    cancel: &CancelToken,
) -> Option<MutexGuard<'a, Box<dyn Agent>>> {
    loop {
        match agent.try_lock() {
            Ok(agent) => return Some(agent),
            Err(TryLockError::Poisoned(poisoned)) => return Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) if cancel.is_cancelled() => return None,
            Err(TryLockError::WouldBlock) => thread::sleep(LOCK_RETRY),
        }
    }
}
