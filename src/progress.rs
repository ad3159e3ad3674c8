//! Progress and log events, and the single thread that prints them.
//!
//! Workers never write to the terminal. They send [`ProgressEvent`]s through a [`Reporter`]
//! and one renderer thread, owning stdout, turns them into lines and progress bars.

use std::{
    collections::BTreeMap,
    io::{self, Write},
    sync::mpsc::{Receiver, Sender},
    thread::{self, JoinHandle},
};

use tracing::debug;

const BAR_WIDTH: usize = 20;

/// Something a worker wants shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// An agent's suite started, with `total` trials to go.
    Started {
        /// Worker slot of the agent.
        slot: usize,
        /// Agent name.
        name: String,
        /// Number of trials.
        total: usize,
    },
    /// One more trial finished.
    Advanced {
        /// Worker slot of the agent.
        slot: usize,
    },
    /// The suite finished.
    Completed {
        /// Worker slot of the agent.
        slot: usize,
    },
    /// A verbose log line.
    Message(String),
}

/// Per-agent handle on the event channel.
///
/// In verbose mode only messages are sent, otherwise only progress.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: Option<Sender<ProgressEvent>>,
    slot: usize,
    verbose: bool,
}

impl Reporter {
    /// A reporter for the agent in `slot`.
    pub fn new(tx: Sender<ProgressEvent>, slot: usize, verbose: bool) -> Self {
        Self {
            tx: Some(tx),
            slot,
            verbose,
        }
    }

    /// A reporter that drops everything.
    pub fn silent() -> Self {
        Self {
            tx: None,
            slot: 0,
            verbose: false,
        }
    }

    /// Shows `msg` in verbose mode.
    pub fn message(&self, msg: impl Into<String>) {
        let msg = msg.into();
        debug!(slot = self.slot, "{msg}");
        if self.verbose {
            self.send(ProgressEvent::Message(msg));
        }
    }

    /// Opens this agent's progress bar.
    pub fn started(&self, name: &str, total: usize) {
        if !self.verbose {
            self.send(ProgressEvent::Started {
                slot: self.slot,
                name: name.to_owned(),
                total,
            });
        }
    }

    /// Advances this agent's progress bar.
    pub fn advance(&self) {
        if !self.verbose {
            self.send(ProgressEvent::Advanced { slot: self.slot });
        }
    }

    /// Closes this agent's progress bar.
    pub fn completed(&self) {
        if !self.verbose {
            self.send(ProgressEvent::Completed { slot: self.slot });
        }
    }

    fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            // the renderer only stops once every sender is gone
            let _ = tx.send(event);
        }
    }
}

#[derive(Debug)]
struct Bar {
    name: String,
    done: usize,
    total: usize,
}

/// Turns events into terminal output.
pub struct Renderer<W: Write> {
    out: W,
    bars: BTreeMap<usize, Bar>,
}

impl<W: Write> Renderer<W> {
    /// A renderer writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            bars: BTreeMap::new(),
        }
    }

    /// Prints one event.
    pub fn handle(&mut self, event: ProgressEvent) -> io::Result<()> {
        match event {
            ProgressEvent::Message(msg) => {
                // clear the status line, print, redraw it below
                writeln!(self.out, "\x1b[2K{msg}")?;
                self.draw_running()?;
            }
            ProgressEvent::Started { slot, name, total } => {
                self.bars.insert(
                    slot,
                    Bar {
                        name,
                        done: 0,
                        total,
                    },
                );
                self.draw_running()?;
            }
            ProgressEvent::Advanced { slot } => {
                if let Some(bar) = self.bars.get_mut(&slot) {
                    bar.done = (bar.done + 1).min(bar.total);
                }
                self.draw_running()?;
            }
            ProgressEvent::Completed { slot } => {
                if let Some(bar) = self.bars.remove(&slot) {
                    // clear line, green name, default color
                    writeln!(self.out, "\x1b[2K\x1b[32m{} COMPLETED\x1b[39m", bar.name)?;
                }
                self.draw_running()?;
            }
        }
        self.out.flush()
    }

    fn draw_running(&mut self) -> io::Result<()> {
        if self.bars.is_empty() {
            return write!(self.out, "\x1b[2K\x1b[0G");
        }
        let running = self
            .bars
            .values()
            .map(|bar| {
                let filled = (bar.done * BAR_WIDTH).checked_div(bar.total).unwrap_or(BAR_WIDTH);
                format!(
                    "{} [{}{}] {}/{}",
                    bar.name,
                    "#".repeat(filled),
                    "-".repeat(BAR_WIDTH - filled),
                    bar.done,
                    bar.total
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        // clear, green, default, start of line
        write!(self.out, "\x1b[2K\x1b[32mRunning...:\x1b[39m {running}\x1b[0G")
    }

    /// Gives the writer back.
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Spawns the thread printing every event of `rx` to stdout until all senders are dropped.
pub fn spawn_renderer(rx: Receiver<ProgressEvent>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("progress-renderer".to_owned())
        .spawn(move || {
            disable_line_wrap();
            let mut renderer = Renderer::new(io::stdout());
            for event in rx {
                if renderer.handle(event).is_err() {
                    break;
                }
            }
            enable_line_wrap();
        })
}

fn disable_line_wrap() {
    print!("\x1b[?7l");
}

fn enable_line_wrap() {
    print!("\x1b[?7h");
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn draws_bars_and_completion() {
        let mut renderer = Renderer::new(Vec::new());
        renderer
            .handle(ProgressEvent::Started {
                slot: 0,
                name: "alice".into(),
                total: 4,
            })
            .unwrap();
        renderer.handle(ProgressEvent::Advanced { slot: 0 }).unwrap();
        renderer.handle(ProgressEvent::Advanced { slot: 0 }).unwrap();
        renderer.handle(ProgressEvent::Completed { slot: 0 }).unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("alice [##########----------] 2/4"));
        assert!(out.contains("alice COMPLETED"));
    }

    #[test]
    fn messages_are_printed_on_their_own_line() {
        let mut renderer = Renderer::new(Vec::new());
        renderer
            .handle(ProgressEvent::Message("Lvl1 - hello".into()))
            .unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("Lvl1 - hello\n"));
    }

    #[test]
    fn reporter_filters_by_mode() {
        let (tx, rx) = mpsc::channel();
        let verbose = Reporter::new(tx.clone(), 1, true);
        verbose.started("bob", 3);
        verbose.message("shown");
        let quiet = Reporter::new(tx, 2, false);
        quiet.message("hidden");
        quiet.advance();
        drop((verbose, quiet));
        let events = rx.into_iter().collect::<Vec<_>>();
        assert_eq!(
            events,
            vec![
                ProgressEvent::Message("shown".into()),
                ProgressEvent::Advanced { slot: 2 },
            ]
        );
    }
}
