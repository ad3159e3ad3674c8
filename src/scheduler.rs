use std::{collections::VecDeque, path::PathBuf};

use tracing::trace;

/// Agents handed to one worker, evaluated one after the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Chunk {
    /// `(slot, unit)` pairs. The slot identifies the agent in progress events.
    pub units: Vec<(usize, PathBuf)>,
}

/// Number of agents per chunk: `min(chunk_size, tasks / workers + 1)`, 1 when unset.
pub(crate) fn effective_chunk_size(
    tasks: usize,
    workers: usize,
    chunk_size: Option<usize>,
) -> usize {
    match chunk_size {
        Some(size) => size.min(tasks / workers.max(1) + 1).max(1),
        None => 1,
    }
}

/// Hands chunks of code units to at most `max_running` workers at a time.
pub(crate) struct WorkScheduler {
    pending: VecDeque<Chunk>,
    max_running: usize,
    running: usize,
    is_finished: bool,
}

impl WorkScheduler {
    pub fn new(units: Vec<PathBuf>, max_running: usize, chunk_size: usize) -> Self {
        let mut pending = VecDeque::new();
        let mut units = units.into_iter().enumerate().peekable();
        while units.peek().is_some() {
            pending.push_back(Chunk {
                units: units.by_ref().take(chunk_size.max(1)).collect(),
            });
        }
        trace!(chunks = pending.len(), max_running, "scheduler ready");

        WorkScheduler {
            pending,
            max_running: max_running.max(1),
            running: 0,
            is_finished: false,
        }
    }

    /// Chunks to start now.
    pub fn advance(&mut self) -> Vec<Chunk> {
        let mut to_run = vec![];
        while self.running + to_run.len() < self.max_running {
            let Some(chunk) = self.pending.pop_front() else {
                break;
            };
            to_run.push(chunk);
        }
        self.running += to_run.len();

        if self.running == 0 && self.pending.is_empty() {
            trace!("no more chunks");
            self.is_finished = true;
        }
        to_run
    }

    /// Records that a chunk finished and returns the chunks to start in its place.
    pub fn on_result(&mut self) -> Vec<Chunk> {
        self.running = self.running.saturating_sub(1);
        self.advance()
    }

    /// Every chunk ran and finished
    pub fn is_finished(&self) -> bool {
        self.is_finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("agent_{i}.yaml"))).collect()
    }

    #[test]
    fn chunk_size_formula() {
        assert_eq!(effective_chunk_size(10, 4, None), 1);
        assert_eq!(effective_chunk_size(10, 4, Some(8)), 3);
        assert_eq!(effective_chunk_size(10, 4, Some(2)), 2);
        assert_eq!(effective_chunk_size(0, 0, Some(5)), 1);
    }

    #[test]
    fn never_runs_more_than_max() {
        let mut scheduler = WorkScheduler::new(units(5), 2, 2);
        let first = scheduler.advance();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].units.len(), 2);
        assert_eq!(first[0].units[1].0, 1);
        assert!(scheduler.advance().is_empty());
        assert!(!scheduler.is_finished());

        let next = scheduler.on_result();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].units, vec![(4, PathBuf::from("agent_4.yaml"))]);

        assert!(scheduler.on_result().is_empty());
        assert!(!scheduler.is_finished());
        assert!(scheduler.on_result().is_empty());
        assert!(scheduler.is_finished());
    }

    #[test]
    fn nothing_to_do() {
        let mut scheduler = WorkScheduler::new(vec![], 4, 1);
        assert!(scheduler.advance().is_empty());
        assert!(scheduler.is_finished());
    }
}
