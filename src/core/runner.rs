//! # Body of one run's worker thread.
//!
//! ```text
//! spawn ─► claim authority ─► predecessor? ──no──────────────┐
//!                                 │ yes                       │
//!                                 ▼                           │
//!                              WAITING ─► wait(predecessor)   │
//!                                 │                           │
//!                          still current? ──no──► Superseded  │
//!                                 │ yes          (no writes)  │
//!                                 ▼                           ▼
//!                              RUNNING ◄──────────────────────┘
//!                                 │
//!            monitor.scope(work.invoke) ─┬─ value   ─► FINISHED
//!                                        ├─ stream  ─► per item: monitor.scope(next) ─► publish
//!                                        │             exhausted ─► FINISHED
//!                                        ├─ error   ─► ERROR
//!                                        └─ abort   ─► (fall through)
//!                                 │
//!                      cleanup (drop guard, exactly once):
//!                        still current? ─► pointer = none ─► token set and
//!                                                            no FINISHED/ERROR written? ─► CANCELLED
//!                                 │
//!                      latch released (successors may proceed)
//! ```
//!
//! ## Rules
//! - Every write is identity-checked through [`Shared`]; a run that lost
//!   authority never touches the result cell or the state.
//! - The abort signal ([`Cancelled`](crate::Cancelled)) and
//!   [`TaskError::Canceled`] are swallowed: never logged as errors, never stored.
//! - Panics in user work are caught and reported as [`TaskError::Panicked`].
//! - Only user work runs under the monitor; bookkeeping between steps does not.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::authority::RunSlot;
use crate::core::monitor::Monitor;
use crate::core::shared::Shared;
use crate::core::TaskState;
use crate::error::TaskError;
use crate::tasks::{Output, Work};

/// Everything a worker thread needs for one run.
pub(crate) struct Runner<T> {
    pub(crate) shared: Arc<Shared<T>>,
    pub(crate) work: Work<T>,
    pub(crate) monitor: Monitor,
    pub(crate) run: u64,
}

/// Releases authority when the run's thread leaves its work, however it leaves.
struct Cleanup<'a, T> {
    shared: &'a Shared<T>,
    token: &'a CancellationToken,
    run: u64,
    /// Set once FINISHED or ERROR was applied; the state then stays put.
    settled: bool,
}

impl<T> Drop for Cleanup<'_, T> {
    fn drop(&mut self) {
        let cancelled = !self.settled && self.token.is_cancelled();
        self.shared.release(self.run, cancelled);
    }
}

impl<T: Send + Sync + 'static> Runner<T> {
    /// Runs on the worker thread until the work ends or the run loses authority.
    pub(crate) fn run(self) {
        let slot = RunSlot::new(self.run);
        // Declared first so it drops last: successors wake after cleanup.
        let _latch = slot.latch();

        // Claimed here, not in `bind`: binds a render apart start their threads in order.
        if let Some(predecessor) = self.shared.authority.claim(Arc::clone(&slot)) {
            debug!(
                task = %self.shared.name,
                run = self.run,
                predecessor = predecessor.id(),
                "waiting for predecessor"
            );
            self.shared.transition(self.run, TaskState::Waiting);
            predecessor.wait();
            if !self.shared.authority.is_current(self.run) {
                self.shared.superseded(self.run, "after waiting for predecessor");
                return;
            }
        }

        let mut cleanup = Cleanup {
            shared: &self.shared,
            token: self.monitor.token(),
            run: self.run,
            settled: false,
        };
        if !self.shared.transition(self.run, TaskState::Running) {
            self.shared.superseded(self.run, "before running");
            return;
        }
        cleanup.settled = self.execute();
    }

    /// Returns `true` once FINISHED or ERROR was written for this run.
    fn execute(&self) -> bool {
        let token = self.monitor.token().clone();
        let output = match self.monitored(|| self.work.invoke(token)) {
            Some(Ok(output)) => output,
            Some(Err(err)) => return self.shared.fail(self.run, err),
            None => return false,
        };

        match output {
            Output::Value(value) => self.shared.complete(self.run, Some(value)),
            Output::Stream(mut items) => {
                let mut index = 0_u64;
                loop {
                    match self.monitored(|| items.next().transpose()) {
                        Some(Ok(Some(value))) => {
                            index += 1;
                            if !self.shared.publish_item(self.run, index, value) {
                                self.shared.superseded(self.run, "while streaming");
                                return false;
                            }
                        }
                        Some(Ok(None)) => break,
                        Some(Err(err)) => return self.shared.fail(self.run, err),
                        None => return false,
                    }
                }
                self.shared.complete(self.run, None)
            }
        }
    }

    /// Runs one step of user work under the monitor.
    ///
    /// `None` means the step was aborted by cancellation.
    fn monitored<R>(&self, f: impl FnOnce() -> Result<R, TaskError>) -> Option<Result<R, TaskError>> {
        match self
            .monitor
            .scope(|| panic::catch_unwind(AssertUnwindSafe(f)))
        {
            Err(_aborted) => None,
            Ok(Err(payload)) => Some(Err(TaskError::from_panic(payload))),
            Ok(Ok(Err(TaskError::Canceled))) => None,
            Ok(Ok(res)) => Some(res),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Bus;
    use std::thread;
    use std::time::{Duration, Instant};

    fn shared() -> Arc<Shared<u32>> {
        Arc::new(Shared::new("runner".into(), Bus::new(64), None))
    }

    fn runner(shared: &Arc<Shared<u32>>, work: Work<u32>, token: CancellationToken) -> Runner<u32> {
        let run = shared.begin();
        Runner {
            shared: Arc::clone(shared),
            work,
            monitor: Monitor::new(token),
            run,
        }
    }

    #[test]
    fn test_single_shot_finishes() {
        let s = shared();
        runner(&s, Work::once(|| Ok(42)), CancellationToken::new()).run();
        let snap = s.snapshot();
        assert_eq!(snap.state, TaskState::Finished);
        assert_eq!(snap.value.as_deref(), Some(&42));
        assert!(snap.error.is_none());
        assert!(!s.authority.is_current(1));
    }

    #[test]
    fn test_error_sets_error_state() {
        let s = shared();
        runner(&s, Work::once(|| Err(TaskError::fail("boom"))), CancellationToken::new()).run();
        let snap = s.snapshot();
        assert_eq!(snap.state, TaskState::Error);
        assert!(snap.value.is_none());
        assert_eq!(snap.error.unwrap().as_label(), "task_failed");
    }

    #[test]
    fn test_panic_is_reported_as_error() {
        let s = shared();
        runner(&s, Work::once(|| panic!("kaput")), CancellationToken::new()).run();
        let snap = s.snapshot();
        assert_eq!(snap.state, TaskState::Error);
        assert_eq!(snap.error.unwrap().as_message(), "panic: kaput");
    }

    #[test]
    fn test_precancelled_run_ends_cancelled_without_error() {
        let s = shared();
        let token = CancellationToken::new();
        token.cancel();
        runner(&s, Work::once(|| Ok(1)), token).run();
        let snap = s.snapshot();
        assert_eq!(snap.state, TaskState::Cancelled);
        assert!(snap.value.is_none());
        assert!(snap.error.is_none());
    }

    #[test]
    fn test_cancel_mid_stream_stops_between_items() {
        let s = shared();
        let token = CancellationToken::new();
        let t = token.clone();
        let work = Work::stream(move || {
            let t = t.clone();
            (1..=5).map(move |n| {
                if n == 3 {
                    t.cancel();
                }
                Ok(n)
            })
        });
        runner(&s, work, token).run();
        let snap = s.snapshot();
        assert_eq!(snap.state, TaskState::Cancelled);
        // item 3 was produced inside the step that cancelled; item 4 never starts
        assert_eq!(snap.value.as_deref(), Some(&3));
        assert!(snap.error.is_none());
    }

    #[test]
    fn test_canceled_error_from_work_is_swallowed() {
        let s = shared();
        let token = CancellationToken::new();
        let work = Work::once_with_token(|t: CancellationToken| {
            t.cancel();
            crate::checkpoint()?;
            Ok(5)
        });
        runner(&s, work, token).run();
        let snap = s.snapshot();
        assert_eq!(snap.state, TaskState::Cancelled);
        assert!(snap.error.is_none());
    }

    #[test]
    fn test_successor_waits_for_predecessor() {
        let s = shared();
        let first = runner(
            &s,
            Work::once(|| {
                thread::sleep(Duration::from_millis(100));
                Ok(1)
            }),
            CancellationToken::new(),
        );
        let a = thread::spawn(move || first.run());
        thread::sleep(Duration::from_millis(20));

        let second = runner(&s, Work::once(|| Ok(2)), CancellationToken::new());
        let started = Instant::now();
        second.run();

        assert!(started.elapsed() >= Duration::from_millis(50));
        a.join().unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.state, TaskState::Finished);
        assert_eq!(snap.value.as_deref(), Some(&2));
    }

    #[test]
    fn test_cancel_after_value_keeps_finished() {
        let s = shared();
        let token = CancellationToken::new();
        // no checkpoint after the cancel: the value still lands
        let work = Work::once_with_token(|t: CancellationToken| {
            t.cancel();
            Ok(8)
        });
        runner(&s, work, token).run();
        let snap = s.snapshot();
        assert_eq!(snap.state, TaskState::Finished);
        assert_eq!(snap.value.as_deref(), Some(&8));
    }

    #[test]
    fn test_cancel_after_error_keeps_error() {
        let s = shared();
        let token = CancellationToken::new();
        let work = Work::once_with_token(|t: CancellationToken| {
            t.cancel();
            Err(TaskError::fail("late"))
        });
        runner(&s, work, token).run();
        let snap = s.snapshot();
        assert_eq!(snap.state, TaskState::Error);
        assert!(snap.error.is_some());
    }
}
