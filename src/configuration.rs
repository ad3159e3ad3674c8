//! Config for the evaluation run
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! The following environment variables can be used to override configuration values. All
//! values are optional. Flags are case-insensitive: set them to `"true"` to enable them.
//!
//! - `EVAL_VERBOSE`: print every trial instead of progress bars (default: `true`)
//! - `EVAL_LOG`: enable logging to a file (default: `false`)
//! - `EVAL_MAX_WORKERS`: number of agents evaluated at once (default: number of CPUs)
//! - `EVAL_CHUNK_SIZE`: agents handed to a worker at a time (default: `1`)
//! - `EVAL_HINT_TIMEOUT_SECS`: deadline of a single hint, in seconds (default: `20`)
//! - `EVAL_LEVELS`: comma separated levels to run, in order (default: `1,2,3,4`)
//! - `EVAL_MODEL`: text-generation model (default: `gpt-4o-mini`)

use std::time::Duration;

use crate::level::Level;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Models the command line accepts.
pub const SUPPORTED_MODELS: [&str; 3] = ["gpt-4o-mini", "gpt-4.1-mini", "gpt-4.1-nano"];

/// Configuration for evaluation behaviors.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub(crate) verbose: bool,
    pub(crate) log: bool,
    pub(crate) max_workers: usize,
    pub(crate) chunk_size: Option<usize>,
    pub(crate) hint_timeout: Duration,
    pub(crate) levels: Vec<Level>,
    pub(crate) model_name: String,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - Every trial is printed to stdout.
    /// - Logging to file is disabled.
    /// - One worker per CPU, one agent per chunk.
    /// - A hint must come back within 20 seconds.
    /// - All four levels run, in increasing order.
    pub fn new() -> Self {
        Self {
            verbose: true,
            log: false,
            max_workers: num_cpus::get(),
            chunk_size: None,
            hint_timeout: Duration::from_secs(20),
            levels: Level::ALL.to_vec(),
            model_name: DEFAULT_MODEL.to_owned(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// See the [module documentation](self) for the recognized variables. Unset or invalid
    /// values keep their default.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn get_env_parsed<T: std::str::FromStr>(var: &str) -> Option<T> {
            std::env::var(var).ok()?.trim().parse().ok()
        }

        let defaults = Self::new();
        let levels = std::env::var("EVAL_LEVELS")
            .ok()
            .and_then(|val| {
                val.split(',')
                    .map(|level| level.trim().parse::<Level>())
                    .collect::<anyhow::Result<Vec<_>>>()
                    .ok()
            })
            .filter(|levels| !levels.is_empty())
            .unwrap_or(defaults.levels);

        Self {
            verbose: get_env_flag("EVAL_VERBOSE", defaults.verbose),
            log: get_env_flag("EVAL_LOG", defaults.log),
            max_workers: get_env_parsed::<usize>("EVAL_MAX_WORKERS")
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_workers),
            chunk_size: get_env_parsed::<usize>("EVAL_CHUNK_SIZE").filter(|&n| n > 0),
            hint_timeout: get_env_parsed::<u64>("EVAL_HINT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.hint_timeout),
            levels,
            model_name: std::env::var("EVAL_MODEL").unwrap_or(defaults.model_name),
        }
    }

    /// Enable or disable per-trial output. Progress bars are shown when disabled.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Set the maximum number of agents evaluated at once (at least 1).
    pub fn with_max_workers(mut self, value: usize) -> Self {
        self.max_workers = value.max(1);
        self
    }

    /// Set how many agents a worker receives at a time.
    pub fn with_chunk_size(mut self, value: Option<usize>) -> Self {
        self.chunk_size = value.filter(|&n| n > 0);
        self
    }

    /// Set the deadline of a single hint request.
    pub fn with_hint_timeout(mut self, value: Duration) -> Self {
        self.hint_timeout = value;
        self
    }

    /// Set the levels to run, in order.
    pub fn with_levels(mut self, value: Vec<Level>) -> Self {
        self.levels = value;
        self
    }

    /// Set the text-generation model.
    pub fn with_model_name(mut self, value: impl Into<String>) -> Self {
        self.model_name = value.into();
        self
    }

    /// Configured text-generation model.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Configured levels, in evaluation order.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = Configuration::new()
            .with_verbose(false)
            .with_max_workers(0)
            .with_chunk_size(Some(0))
            .with_levels(vec![Level::Four, Level::One])
            .with_model_name("gpt-4.1-nano");
        assert!(!config.verbose);
        assert_eq!(config.max_workers, 1);
        assert_eq!(config.chunk_size, None);
        assert_eq!(config.levels(), &[Level::Four, Level::One]);
        assert_eq!(config.model_name(), "gpt-4.1-nano");
        assert_eq!(config.hint_timeout, Duration::from_secs(20));
    }
}
