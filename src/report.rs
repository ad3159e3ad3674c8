//! Ranking of a whole run and its textual table.

use std::{fmt, path::PathBuf};

use crate::score::AgentReport;

const NAME_WIDTH: usize = 30;

/// An agent that could not be evaluated at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentFailure {
    /// Code unit of the agent.
    pub unit: PathBuf,
    /// What went wrong, with its causes.
    pub error: String,
}

/// Agents sorted by score, followed by the agents that failed.
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    ranked: Vec<AgentReport>,
    failures: Vec<AgentFailure>,
}

impl Ranking {
    /// Ranks `outcomes`, whatever order they completed in.
    pub fn new(outcomes: impl IntoIterator<Item = Result<AgentReport, AgentFailure>>) -> Self {
        let (mut ranked, mut failures) = (Vec::new(), Vec::new());
        for outcome in outcomes {
            match outcome {
                Ok(report) => ranked.push(report),
                Err(failure) => failures.push(failure),
            }
        }
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.agent_name.cmp(&b.agent_name))
                .then_with(|| a.unit.cmp(&b.unit))
        });
        failures.sort_by(|a, b| a.unit.cmp(&b.unit));
        Ranking { ranked, failures }
    }

    /// Evaluated agents, best first.
    pub fn ranked(&self) -> &[AgentReport] {
        &self.ranked
    }

    /// Agents that produced no report.
    pub fn failures(&self) -> &[AgentFailure] {
        &self.failures
    }

    /// Number of agents in the run.
    pub fn len(&self) -> usize {
        self.ranked.len() + self.failures.len()
    }

    /// True if the run had no agent.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<3} | {:<30} | {:<8} | {:<11} | {:<12} | EXCEPTIONS | ACCURACY",
            "POS", "AGENT NAME", "TIME", "CORRECT", "POINTS"
        )?;
        for (i, report) in self.ranked.iter().enumerate() {
            let name = report.agent_name.chars().take(NAME_WIDTH).collect::<String>();
            let time = format!("{:.2}", report.elapsed.as_secs_f64());
            let accuracy = report
                .accuracy()
                .iter()
                .map(|(level, accuracy)| format!("{level}: {accuracy}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                f,
                "{:<3} | {name:<30} | {time:<7}s | {:<3} correct | {:<5} points | {:<10} | {{{accuracy}}}",
                i + 1,
                report.total_correct(),
                report.score,
                report.exceptions(),
            )?;
        }
        for failure in &self.failures {
            writeln!(
                f,
                "N/A | {:<30} | ERROR: {}",
                failure.unit.display().to_string(),
                failure.error
            )?;
        }
        Ok(())
    }
}
