//! Wall-clock deadline around blocking work.
//!
//! The work runs on its own thread. When the deadline passes the caller gets
//! [`GuardError::TimedOut`] right away, the work's [`CancelToken`] is raised, and the thread is
//! detached: it stops only once the work observes the token or returns on its own.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
    time::Duration,
};

use tracing::{trace, warn};

/// Cooperative cancellation flag shared between a guard and its work.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, unraised token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// True once the token was raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Why guarded work produced no value.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// The deadline passed first.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    /// The work panicked.
    #[error("panicked: {0}")]
    Panicked(String),

    /// No thread could be spawned for the work.
    #[error("could not spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Runs work under a fixed deadline.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    deadline: Duration,
}

impl TimeoutGuard {
    /// A guard allowing `deadline` per call.
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// Runs `work`, waiting at most the deadline for its result.
    pub fn run<T, F>(&self, name: &str, work: F) -> Result<T, GuardError>
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> T + Send + 'static,
    {
        let token = CancelToken::new();
        let (tx, rx) = mpsc::channel();

        let worker_token = token.clone();
        thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| work(&worker_token)));
                // the receiver is gone if the guard already timed out
                let _ = tx.send(result.map_err(panic_message));
            })?;

        match rx.recv_timeout(self.deadline) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(msg)) => Err(GuardError::Panicked(msg)),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                token.cancel();
                warn!(worker = name, "abandoning work after {:?}", self.deadline);
                Err(GuardError::TimedOut(self.deadline))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                trace!("worker dropped its sender without a result");
                Err(GuardError::Panicked("worker exited without a result".to_owned()))
            }
        }
    }
}

pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn returns_value_before_deadline() {
        let guard = TimeoutGuard::new(Duration::from_secs(5));
        assert_eq!(guard.run("quick", |_| 42).unwrap(), 42);
    }

    #[test]
    fn never_returning_work_times_out() {
        let guard = TimeoutGuard::new(Duration::from_millis(100));
        let start = Instant::now();
        let result = guard.run("stuck", |_| loop {
            thread::sleep(Duration::from_millis(10));
        });
        assert!(matches!(result, Err(GuardError::TimedOut(_))));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn timed_out_work_sees_cancellation() {
        let guard = TimeoutGuard::new(Duration::from_millis(50));
        let (tx, rx) = mpsc::channel();
        let result = guard.run("cooperative", move |cancel| {
            while !cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(5));
            }
            tx.send(()).unwrap();
        });
        assert!(matches!(result, Err(GuardError::TimedOut(_))));
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn panics_are_reported() {
        let guard = TimeoutGuard::new(Duration::from_secs(5));
        let result: Result<(), _> = guard.run("panicking", |_| panic!("boom"));
        match result {
            Err(GuardError::Panicked(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
