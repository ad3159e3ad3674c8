//! One agent's full test suite: every configured level, every challenge word.

use std::{
    collections::BTreeMap,
    panic::{self, AssertUnwindSafe},
    path::Path,
    sync::{Arc, Mutex},
    time::Instant,
};

use anyhow::Context;
use tracing::{info, instrument, warn};

use crate::{
    agent::AgentContext,
    agent_collector::load_agent,
    challenge::Dataset,
    configuration::Configuration,
    evaluator::{SampleEvaluator, SharedAgent},
    guesser::Guesser,
    llm::GeneratorFactory,
    progress::Reporter,
    registry::AgentRegistry,
    score::{AgentReport, OutcomeKind, Tally},
    timeout::{panic_message, TimeoutGuard},
};

/// Loads the agent of `unit` and plays every word of `dataset` at every configured level.
///
/// Levels run in configured order and words in list order. Trial failures, panics included,
/// are tallied and never stop the suite. Only a load failure ends it early.
#[instrument(skip_all, fields(unit = %unit.display()))]
pub fn run_agent_suite(
    unit: &Path,
    dataset: &Dataset,
    registry: &AgentRegistry,
    services: &GeneratorFactory,
    config: &Configuration,
    reporter: &Reporter,
) -> anyhow::Result<AgentReport> {
    let start = Instant::now();

    let ctx = AgentContext {
        llm: services(config.model_name()).context("opening the agent's service handle")?,
        hints_db: Arc::clone(&dataset.hints_db),
    };
    let agent = load_agent(unit, ctx, registry)?;
    let agent_name = agent.name();
    let agent: SharedAgent = Arc::new(Mutex::new(agent));

    let guesser = Guesser::new(
        services(config.model_name()).context("opening the guesser's service handle")?,
    );
    let evaluator = SampleEvaluator::new(
        agent,
        &guesser,
        &dataset.rules,
        TimeoutGuard::new(config.hint_timeout),
        reporter,
    );

    info!(agent_name = %agent_name, "suite started");
    reporter.started(&agent_name, config.levels().len() * dataset.words.len());

    let mut results: BTreeMap<_, Tally> = BTreeMap::new();
    for &level in config.levels() {
        let tally = results.entry(level).or_default();
        for word in &dataset.words {
            let trial = panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(word, level)));
            let kind = match trial {
                Ok(Ok(outcome)) => outcome.kind(),
                Ok(Err(e)) => {
                    warn!(agent_name = %agent_name, %level, "{e}");
                    reporter.message(format!("Lvl{level} - {e}"));
                    e.kind()
                }
                Err(payload) => {
                    let msg = panic_message(payload);
                    warn!(
                        agent_name = %agent_name,
                        %level,
                        word = %word.target,
                        "trial panicked: {msg}"
                    );
                    reporter.message(format!(
                        "Lvl{level} - uncaught error for word '{}': {msg}",
                        word.target
                    ));
                    OutcomeKind::UncaughtError
                }
            };
            tally.record(kind);
            reporter.advance();
        }
    }

    let elapsed = start.elapsed();
    let report = AgentReport::new(agent_name, unit.to_owned(), elapsed, results);

    reporter.message(format!(
        "{} - Execution Time: {:.2} s",
        report.agent_name,
        elapsed.as_secs_f64()
    ));
    for (level, accuracy) in report.accuracy() {
        reporter.message(format!(
            "{} - Accuracy Lvl{level}: {accuracy}",
            report.agent_name
        ));
    }
    reporter.completed();
    info!(agent_name = %report.agent_name, score = report.score, "suite finished");

    Ok(report)
}
