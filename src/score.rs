//! Outcome tallies and score aggregation.

use std::{collections::BTreeMap, fmt, path::PathBuf, time::Duration};

use crate::level::Level;

/// The category a finished trial is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// Valid hint and correct guess.
    Correct,
    /// Rule-breaking hint or wrong guess.
    Incorrect,
    /// The agent failed or timed out.
    AgentError,
    /// The guesser failed.
    GuesserError,
    /// Anything else.
    UncaughtError,
}

/// Per-level outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Correct guesses.
    pub correct: u32,
    /// Bad hints and bad guesses.
    pub incorrect: u32,
    /// Agent failures, timeouts included.
    pub agent_error: u32,
    /// Guesser failures.
    pub guesser_error: u32,
    /// Unclassified failures.
    pub uncaught_error: u32,
}

impl Tally {
    /// Counts one trial.
    pub fn record(&mut self, kind: OutcomeKind) {
        let counter = match kind {
            OutcomeKind::Correct => &mut self.correct,
            OutcomeKind::Incorrect => &mut self.incorrect,
            OutcomeKind::AgentError => &mut self.agent_error,
            OutcomeKind::GuesserError => &mut self.guesser_error,
            OutcomeKind::UncaughtError => &mut self.uncaught_error,
        };
        *counter += 1;
    }

    /// Number of trials counted.
    pub fn attempts(&self) -> u32 {
        self.correct + self.incorrect + self.errors()
    }

    /// Number of trials that ended in an error of any origin.
    pub fn errors(&self) -> u32 {
        self.agent_error + self.guesser_error + self.uncaught_error
    }

    /// Correct answers over attempts.
    pub fn accuracy(&self) -> Accuracy {
        Accuracy {
            correct: self.correct,
            total: self.attempts(),
        }
    }
}

/// Correct answers out of the attempts made at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accuracy {
    /// Correct answers.
    pub correct: u32,
    /// Attempts.
    pub total: u32,
}

impl Accuracy {
    /// `correct / total`, 0 when nothing was attempted.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.total)
        }
    }

    /// The ratio as a percentage rounded to two decimals.
    pub fn percent(&self) -> f64 {
        (self.ratio() * 100.0 * 100.0).round() / 100.0
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}%)", self.correct, self.total, self.percent())
    }
}

/// `Σ correct × sqrt(level)`, rounded to one decimal.
pub fn compute_score(results: &BTreeMap<Level, Tally>) -> f64 {
    let score = results
        .iter()
        .map(|(level, tally)| f64::from(tally.correct) * level.weight())
        .sum::<f64>();
    (score * 10.0).round() / 10.0
}

/// Final result of one agent's suite. Immutable once built.
#[derive(Debug, Clone)]
pub struct AgentReport {
    /// Name returned by the agent.
    pub agent_name: String,
    /// Code unit the agent was loaded from.
    pub unit: PathBuf,
    /// Wall-clock duration of the suite.
    pub elapsed: Duration,
    /// Outcomes per level.
    pub results: BTreeMap<Level, Tally>,
    /// Weighted score.
    pub score: f64,
}

impl AgentReport {
    /// Builds the report and computes its score.
    pub fn new(
        agent_name: String,
        unit: PathBuf,
        elapsed: Duration,
        results: BTreeMap<Level, Tally>,
    ) -> Self {
        let score = compute_score(&results);
        Self {
            agent_name,
            unit,
            elapsed,
            results,
            score,
        }
    }

    /// Accuracy at each level.
    pub fn accuracy(&self) -> BTreeMap<Level, Accuracy> {
        self.results
            .iter()
            .map(|(level, tally)| (*level, tally.accuracy()))
            .collect()
    }

    /// Correct answers over every level.
    pub fn total_correct(&self) -> u32 {
        self.results.values().map(|t| t.correct).sum()
    }

    /// Agent, guesser and uncaught errors over every level.
    pub fn exceptions(&self) -> u32 {
        self.results.values().map(Tally::errors).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(correct: u32) -> Tally {
        Tally {
            correct,
            ..Default::default()
        }
    }

    #[test]
    fn score_is_weighted_by_sqrt_level() {
        let results = BTreeMap::from([
            (Level::One, tally(3)),
            (Level::Two, tally(0)),
            (Level::Three, tally(2)),
            (Level::Four, tally(1)),
        ]);
        assert_eq!(compute_score(&results), 8.5);
        assert_eq!(compute_score(&BTreeMap::new()), 0.0);
    }

    #[test]
    fn tally_records_every_kind() {
        let mut t = Tally::default();
        for kind in [
            OutcomeKind::Correct,
            OutcomeKind::Correct,
            OutcomeKind::Incorrect,
            OutcomeKind::AgentError,
            OutcomeKind::GuesserError,
            OutcomeKind::UncaughtError,
        ] {
            t.record(kind);
        }
        assert_eq!(t.correct, 2);
        assert_eq!(t.attempts(), 6);
        assert_eq!(t.errors(), 3);
        assert_eq!(t.accuracy().to_string(), "2/6 (33.33%)");
    }

    #[test]
    fn empty_accuracy_is_zero() {
        let acc = Tally::default().accuracy();
        assert_eq!(acc.ratio(), 0.0);
        assert_eq!(acc.to_string(), "0/0 (0%)");
    }

    #[test]
    fn report_aggregates_levels() {
        let mut one = tally(2);
        one.agent_error = 1;
        let mut four = tally(1);
        four.uncaught_error = 2;
        four.guesser_error = 1;
        let report = AgentReport::new(
            "alice".into(),
            PathBuf::from("agents/alice.yaml"),
            Duration::from_secs(1),
            BTreeMap::from([(Level::One, one), (Level::Four, four)]),
        );
        assert_eq!(report.total_correct(), 3);
        assert_eq!(report.exceptions(), 4);
        assert_eq!(report.score, 4.0);
        assert_eq!(report.accuracy()[&Level::Four].to_string(), "1/4 (25%)");
    }
}
