//! Evaluates every agent of a directory and prints the ranking.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use taboo_eval::{
    configuration::{DEFAULT_MODEL, SUPPORTED_MODELS},
    prelude::*,
};

/// Taboo agent evaluation
#[derive(Parser)]
#[command(name = "taboo-eval")]
#[command(about = "Evaluate Taboo hint agents and rank them", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the agent code units
    #[arg(long, default_value = "agents")]
    folder: PathBuf,

    /// Levels to run, in order
    #[arg(long, num_args = 1.., env = "EVAL_LEVELS", value_delimiter = ',')]
    levels: Option<Vec<Level>>,

    /// Text-generation model used by agents and guesser
    #[arg(long, env = "EVAL_MODEL", default_value = DEFAULT_MODEL, value_parser = SUPPORTED_MODELS)]
    model_name: String,

    /// Show progress bars instead of every trial
    #[arg(long)]
    quiet: bool,

    /// Write every log event to a timestamped file
    #[arg(long)]
    log: bool,

    /// Word list, one `target:taboo:...` entry per line
    #[arg(long, default_value = "data/words_with_taboo.txt")]
    words_path: PathBuf,

    /// Admissible level 3 hints, one per line
    #[arg(long, default_value = "data/level3_data/hints.txt")]
    hints_path: PathBuf,

    /// Precomputed embeddings of the level 3 hints
    #[arg(long, default_value = "data/level3_data/hints_db.json")]
    hints_db_path: PathBuf,

    /// Italian to French translations used at level 2
    #[arg(long, default_value = "data/translations/it_fr.json")]
    translations_path: PathBuf,

    /// Maximum number of agents evaluated at once
    #[arg(long)]
    max_workers: Option<usize>,

    /// Number of agents handed to a worker at a time
    #[arg(long)]
    chunksize: Option<usize>,

    /// Deadline of a single hint, in seconds
    #[arg(long)]
    hint_timeout: Option<u64>,
}

impl Cli {
    fn configuration(&self) -> Configuration {
        let mut config = Configuration::from_env().with_model_name(&self.model_name);
        if self.quiet {
            config = config.with_verbose(false);
        }
        if self.log {
            config = config.with_log(true);
        }
        if let Some(levels) = &self.levels {
            config = config.with_levels(levels.clone());
        }
        if let Some(max_workers) = self.max_workers {
            config = config.with_max_workers(max_workers);
        }
        if self.chunksize.is_some() {
            config = config.with_chunk_size(self.chunksize);
        }
        if let Some(secs) = self.hint_timeout {
            config = config.with_hint_timeout(Duration::from_secs(secs));
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.configuration();

    // fail fast instead of once per agent
    OpenAiClient::from_env(config.model_name())
        .context("the text-generation service is not configured")?;

    let dataset = Dataset::load(
        &cli.words_path,
        &cli.hints_path,
        &cli.translations_path,
        &cli.hints_db_path,
    )?;

    let services: GeneratorFactory =
        Arc::new(|model: &str| -> anyhow::Result<Arc<dyn TextGenerator>> {
            Ok(Arc::new(OpenAiClient::from_env(model)?))
        });

    let orchestrator = Orchestrator::new(
        config,
        Arc::new(AgentRegistry::with_builtins()),
        Arc::new(dataset),
        services,
    )?;
    let ranking = orchestrator.evaluate(&cli.folder)?;

    println!("\n{ranking}");
    Ok(())
}
