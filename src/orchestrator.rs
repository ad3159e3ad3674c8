//! Parallel evaluation of every agent of a directory.
//!
//! This module defines the [`Orchestrator`] type. Its responsibilities include:
//!
//! - Collecting the code units of a directory (see [`crate::agent_collector`])
//! - Running each agent's test suite on a bounded set of worker threads
//! - Capturing whatever escapes a suite as an [`AgentFailure`] instead of aborting the run
//! - Ranking the reports once every agent is done
//!
//! # Behavior & Configuration
//!
//! Behavior is controlled by a [`Configuration`] object:
//!
//! - `max_workers` bounds how many agents run at once, `chunk_size` how many agents a worker
//!   receives at a time.
//! - In verbose mode every trial is printed, otherwise one progress bar is drawn per running
//!   agent. Either way a single thread writes to the terminal.
//! - When `log` is set, every `tracing` event is written to a timestamped file.
//!
//! Each agent and each guesser gets its own text-generation handle from the
//! [`GeneratorFactory`], and agents never share state.

use std::{
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Sender},
        Arc,
    },
    thread,
};

use anyhow::{anyhow, Context};
use tracing::{error, info, instrument, trace};

use crate::{
    agent_collector::collect_units,
    challenge::Dataset,
    configuration::Configuration,
    llm::GeneratorFactory,
    logger::init_logger,
    progress::{spawn_renderer, ProgressEvent, Reporter},
    registry::AgentRegistry,
    report::{AgentFailure, Ranking},
    scheduler::{effective_chunk_size, Chunk, WorkScheduler},
    score::AgentReport,
    suite::run_agent_suite,
    timeout::panic_message,
};

type UnitOutcome = Result<AgentReport, AgentFailure>;

enum WorkerMessage {
    Unit(UnitOutcome),
    ChunkDone,
}

/// Runs agent suites in parallel and ranks them.
pub struct Orchestrator {
    config: Configuration,
    registry: Arc<AgentRegistry>,
    dataset: Arc<Dataset>,
    services: GeneratorFactory,
}

impl Orchestrator {
    /// Create an [`Orchestrator`], installing the file logger if the configuration asks for it.
    #[instrument(skip_all)]
    pub fn new(
        config: Configuration,
        registry: Arc<AgentRegistry>,
        dataset: Arc<Dataset>,
        services: GeneratorFactory,
    ) -> anyhow::Result<Self> {
        if config.log {
            init_logger()?;
        }
        trace!(?config, ?registry);

        Ok(Orchestrator {
            config,
            registry,
            dataset,
            services,
        })
    }

    /// Evaluates every code unit of `directory`.
    ///
    /// Waits for every agent before ranking. An agent whose suite fails, or panics, is listed
    /// among the ranking's failures and does not affect the others.
    ///
    /// # Errors
    /// Returns an error if the directory is invalid or the progress renderer cannot be started.
    /// The units of a worker that cannot be started are reported as failures.
    pub fn evaluate(&self, directory: impl AsRef<Path>) -> anyhow::Result<Ranking> {
        // 1. get code units in *directory*
        let units = collect_units(directory.as_ref())?;
        if units.is_empty() {
            info!("no agent to evaluate");
            return Ok(Ranking::default());
        }

        // 2. size the pool
        let workers = self.config.max_workers.min(units.len()).max(1);
        let chunk_size = effective_chunk_size(units.len(), workers, self.config.chunk_size);
        info!(agents = units.len(), workers, chunk_size);

        // 3. single writer for the terminal
        let (tx_progress, rx_progress) = mpsc::channel();
        let renderer = spawn_renderer(rx_progress).context("starting the progress renderer")?;

        // 4. run every chunk
        let scheduler = WorkScheduler::new(units, workers, chunk_size);
        let outcomes = run_chunks(scheduler, |chunk, tx_result| {
            self.launch_chunk(chunk, tx_result, tx_progress.clone())
        });

        // 5. let the renderer drain and restore the terminal
        drop(tx_progress);
        if renderer.join().is_err() {
            error!("progress renderer panicked");
        }
        let outcomes = outcomes?;

        let ranking = Ranking::new(outcomes);
        info!(
            ranked = ranking.ranked().len(),
            failed = ranking.failures().len(),
            "run finished"
        );
        Ok(ranking)
    }

    fn launch_chunk(
        &self,
        chunk: Chunk,
        tx_result: Sender<WorkerMessage>,
        tx_progress: Sender<ProgressEvent>,
    ) -> anyhow::Result<()> {
        let config = self.config.clone();
        let registry = Arc::clone(&self.registry);
        let dataset = Arc::clone(&self.dataset);
        let services = Arc::clone(&self.services);

        thread::Builder::new()
            .name("agent-worker".to_owned())
            .spawn(move || {
                for (slot, unit) in chunk.units {
                    let reporter = Reporter::new(tx_progress.clone(), slot, config.verbose);
                    let outcome =
                        evaluate_unit(unit, &dataset, &registry, &services, &config, &reporter);
                    // the receiver lives until every chunk is done
                    let _ = tx_result.send(WorkerMessage::Unit(outcome));
                }
                let _ = tx_result.send(WorkerMessage::ChunkDone);
            })
            .context("starting an agent worker")?;
        Ok(())
    }
}

/// Drives `scheduler` until every chunk is done, starting chunks with `launch`.
///
/// The units of a chunk that cannot be launched are recorded as failures.
fn run_chunks(
    mut scheduler: WorkScheduler,
    mut launch: impl FnMut(Chunk, Sender<WorkerMessage>) -> anyhow::Result<()>,
) -> anyhow::Result<Vec<UnitOutcome>> {
    let (tx_result, rx_result) = mpsc::channel();
    let mut outcomes = Vec::new();

    let mut to_launch = scheduler.advance();
    while !scheduler.is_finished() {
        for chunk in to_launch.drain(..) {
            let units = chunk.units.iter().map(|(_, unit)| unit.clone()).collect::<Vec<_>>();
            if let Err(e) = launch(chunk, tx_result.clone()) {
                let error = format!("{e:#}");
                error!(agents = units.len(), "{error}");
                outcomes.extend(units.into_iter().map(|unit| {
                    Err(AgentFailure {
                        unit,
                        error: error.clone(),
                    })
                }));
                // the receiver is owned by this loop
                let _ = tx_result.send(WorkerMessage::ChunkDone);
            }
        }
        // not finished <=> chunk running <=> message to receive
        match rx_result.recv() {
            Ok(WorkerMessage::Unit(outcome)) => outcomes.push(outcome),
            Ok(WorkerMessage::ChunkDone) => to_launch = scheduler.on_result(),
            Err(_) => return Err(anyhow!("every worker hung up before finishing")),
        }
    }
    Ok(outcomes)
}

/// Runs the suite of `unit`, turning an error or a panic into an [`AgentFailure`].
///
/// A failed unit still closes its progress bar.
fn evaluate_unit(
    unit: PathBuf,
    dataset: &Dataset,
    registry: &AgentRegistry,
    services: &GeneratorFactory,
    config: &Configuration,
    reporter: &Reporter,
) -> UnitOutcome {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_agent_suite(&unit, dataset, registry, services, config, reporter)
    }));
    let error = match outcome {
        Ok(Ok(report)) => return Ok(report),
        Ok(Err(e)) => format!("{e:#}"),
        Err(payload) => format!("panicked: {}", panic_message(payload)),
    };
    error!(unit = %unit.display(), "agent could not be evaluated: {error}");
    reporter.message(format!("{}: ERROR: {error}", unit.display()));
    reporter.completed();
    Err(AgentFailure { unit, error })
}
