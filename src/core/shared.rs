//! # State shared between a hook, its runs, and its observers.
//!
//! [`Shared`] bundles the hand-off [`Authority`], the [`ResultCell`], the state
//! cell and the event [`Bus`]. Every write made on behalf of a run goes through
//! one of the `run`-taking methods below, which apply it only while that run is
//! authoritative. A rejected write is dropped silently (debug log only).
//!
//! ## Write paths
//! ```text
//! begin()            caller thread   STARTING (unguarded, initial transition)
//! transition()       run thread      WAITING / RUNNING
//! publish_item()     run thread      value = item, error = none
//! complete()         run thread      [value = v,] FINISHED
//! fail()             run thread      error = e, ERROR (logged)
//! release()          run thread      pointer = none [, CANCELLED]
//! spawn_failed()     caller thread   error = e, ERROR (only with no authoritative run)
//! ```
//!
//! Each applied write publishes its [`Event`] while still holding the hand-off
//! lock, so the bus order of write events is the order of the writes. The
//! re-render callback runs afterwards, outside the lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::core::authority::Authority;
use crate::core::cell::{ResultCell, TaskResult};
use crate::core::state::StateCell;
use crate::core::TaskState;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};

/// Asks the host renderer to render again.
///
/// Result-cell writes are not observed by the renderer, so the hook calls this
/// after every state transition and every published lazy-sequence item.
pub trait Rerender: Send + Sync + 'static {
    fn request_rerender(&self);
}

impl<F> Rerender for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn request_rerender(&self) {
        self()
    }
}

pub(crate) struct Shared<T> {
    pub(crate) name: Arc<str>,
    pub(crate) authority: Authority,
    state: StateCell,
    cell: ResultCell<T>,
    bus: Bus,
    rerender: Option<Arc<dyn Rerender>>,
    next_run: AtomicU64,
}

impl<T> Shared<T> {
    pub(crate) fn new(name: Arc<str>, bus: Bus, rerender: Option<Arc<dyn Rerender>>) -> Self {
        Self {
            name,
            authority: Authority::default(),
            state: StateCell::default(),
            cell: ResultCell::new(),
            bus,
            rerender,
            next_run: AtomicU64::new(1),
        }
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }

    pub(crate) fn state(&self) -> TaskState {
        self.state.get()
    }

    pub(crate) fn snapshot(&self) -> TaskResult<T> {
        let (value, error) = self.cell.read();
        TaskResult {
            value,
            error,
            state: self.state.get(),
        }
    }

    /// Allocates a run id and moves to `STARTING`.
    pub(crate) fn begin(&self) -> u64 {
        let run = self.next_run.fetch_add(1, Ordering::Relaxed);
        self.set_state(run, TaskState::Starting);
        self.emit(run, TaskState::Starting, None);
        self.notify();
        run
    }

    /// Applies `next` if `run` is authoritative.
    pub(crate) fn transition(&self, run: u64, next: TaskState) -> bool {
        let applied = self
            .authority
            .when_current(run, || {
                self.set_state(run, next);
                self.emit(run, next, None);
            })
            .is_some();
        if applied {
            self.notify();
        } else {
            debug!(task = %self.name, run, state = %next, "discarding transition from superseded run");
        }
        applied
    }

    /// Publishes one lazy-sequence item if `run` is authoritative.
    pub(crate) fn publish_item(&self, run: u64, index: u64, value: T) -> bool {
        let applied = self
            .authority
            .when_current(run, || {
                self.cell.set_value(value);
                self.bus.publish(
                    Event::new(EventKind::ItemPublished)
                        .with_task(self.name.clone())
                        .with_run(run)
                        .with_item(index),
                );
            })
            .is_some();
        if applied {
            self.notify();
        } else {
            debug!(task = %self.name, run, item = index, "discarding item from superseded run");
        }
        applied
    }

    /// Stores `value` (if any) and moves to `FINISHED` if `run` is authoritative.
    pub(crate) fn complete(&self, run: u64, value: Option<T>) -> bool {
        let applied = self
            .authority
            .when_current(run, || {
                if let Some(v) = value {
                    self.cell.set_value(v);
                }
                self.set_state(run, TaskState::Finished);
                self.emit(run, TaskState::Finished, None);
            })
            .is_some();
        if applied {
            self.notify();
        } else {
            debug!(task = %self.name, run, "discarding result from superseded run");
        }
        applied
    }

    /// Records `err` and moves to `ERROR` if `run` is authoritative.
    pub(crate) fn fail(&self, run: u64, err: TaskError) -> bool {
        let reason = err.to_string();
        let applied = self
            .authority
            .when_current(run, || {
                error!(task = %self.name, run, label = err.as_label(), error = %err, "work failed");
                self.cell.set_error(err);
                self.set_state(run, TaskState::Error);
                self.emit(run, TaskState::Error, Some(&reason));
            })
            .is_some();
        if applied {
            self.notify();
        } else {
            debug!(task = %self.name, run, error = %reason, "discarding error from superseded run");
        }
        applied
    }

    /// Drops authority at thread exit; moves to `CANCELLED` when `cancelled`.
    ///
    /// Returns `true` if `run` was still authoritative.
    pub(crate) fn release(&self, run: u64, cancelled: bool) -> bool {
        let released = self
            .authority
            .release(run, || {
                if cancelled {
                    self.set_state(run, TaskState::Cancelled);
                    self.emit(run, TaskState::Cancelled, None);
                }
            })
            .is_some();
        if released {
            info!(task = %self.name, run, cancelled, "thread done");
            if cancelled {
                self.notify();
            }
        }
        released
    }

    /// Reports that `run` lost authority and exits without writing.
    pub(crate) fn superseded(&self, run: u64, at: &'static str) {
        debug!(task = %self.name, run, at, "run superseded");
        self.bus.publish(
            Event::new(EventKind::Superseded)
                .with_task(self.name.clone())
                .with_run(run)
                .with_reason(at),
        );
    }

    /// Records a thread spawn failure unless another run is authoritative.
    pub(crate) fn spawn_failed(&self, run: u64, err: std::io::Error) {
        warn!(task = %self.name, run, error = %err, "failed to spawn worker thread");
        let err = TaskError::Spawn {
            error: err.to_string(),
        };
        let reason = err.to_string();
        let applied = self
            .authority
            .when_idle(|| {
                self.cell.set_error(err);
                self.set_state(run, TaskState::Error);
                self.emit(run, TaskState::Error, Some(&reason));
            })
            .is_some();
        if applied {
            self.notify();
        }
    }

    fn set_state(&self, run: u64, next: TaskState) {
        let prev = self.state.set(next);
        if !prev.can_transition(next) {
            warn!(task = %self.name, run, from = %prev, to = %next, "unexpected state transition");
        }
    }

    fn emit(&self, run: u64, state: TaskState, reason: Option<&str>) {
        if let Some(kind) = EventKind::for_state(state) {
            let mut ev = Event::new(kind).with_task(self.name.clone()).with_run(run);
            if let Some(reason) = reason {
                ev = ev.with_reason(reason);
            }
            self.bus.publish(ev);
        }
    }

    fn notify(&self) {
        if let Some(rerender) = &self.rerender {
            rerender.request_rerender();
        }
    }
}

/// Cloneable, read-only view of a hook's result.
///
/// Reads never block on running work; they may observe stale values.
pub struct ResultHandle<T> {
    pub(crate) shared: Arc<Shared<T>>,
}

impl<T> Clone for ResultHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> ResultHandle<T> {
    /// Hook name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.shared.state()
    }

    /// Latest published value.
    pub fn value(&self) -> Option<Arc<T>> {
        self.shared.cell.value()
    }

    /// Latest published error.
    pub fn error(&self) -> Option<Arc<TaskError>> {
        self.shared.cell.error()
    }

    /// Value, error and state in one read.
    pub fn snapshot(&self) -> TaskResult<T> {
        self.shared.snapshot()
    }

    /// Receiver for the hook's subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus().subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::authority::RunSlot;
    use std::sync::atomic::AtomicUsize;

    fn shared() -> Shared<&'static str> {
        Shared::new("test".into(), Bus::new(64), None)
    }

    #[test]
    fn test_writes_require_authority() {
        let s = shared();
        let run = s.begin();
        assert_eq!(s.state(), TaskState::Starting);

        assert!(!s.transition(run, TaskState::Running));
        assert!(!s.complete(run, Some("lost")));
        assert!(s.snapshot().value.is_none());

        s.authority.claim(RunSlot::new(run));
        assert!(s.transition(run, TaskState::Running));
        assert!(s.complete(run, Some("kept")));
        let snap = s.snapshot();
        assert_eq!(snap.state, TaskState::Finished);
        assert_eq!(snap.value.as_deref(), Some(&"kept"));
    }

    #[test]
    fn test_release_marks_cancelled_only_for_current() {
        let s = shared();
        let run = s.begin();
        s.authority.claim(RunSlot::new(run));
        s.transition(run, TaskState::Running);

        assert!(!s.release(run + 1, true));
        assert_eq!(s.state(), TaskState::Running);

        assert!(s.release(run, true));
        assert_eq!(s.state(), TaskState::Cancelled);
        // second release is a no-op
        assert!(!s.release(run, true));
    }

    #[test]
    fn test_fail_keeps_value_and_sets_error() {
        let s = shared();
        let run = s.begin();
        s.authority.claim(RunSlot::new(run));
        s.transition(run, TaskState::Running);
        assert!(s.publish_item(run, 1, "partial"));
        assert!(s.fail(run, TaskError::fail("boom")));

        let snap = s.snapshot();
        assert_eq!(snap.state, TaskState::Error);
        assert_eq!(snap.value.as_deref(), Some(&"partial"));
        assert!(snap.error.is_some());
    }

    #[test]
    fn test_spawn_failure_only_when_idle() {
        let s = shared();
        let run = s.begin();
        s.spawn_failed(run, std::io::Error::other("no threads"));
        assert_eq!(s.state(), TaskState::Error);
        assert_eq!(s.snapshot().error.unwrap().as_label(), "task_spawn_failed");

        let other = s.begin();
        s.authority.claim(RunSlot::new(other));
        let next = s.begin();
        s.spawn_failed(next, std::io::Error::other("no threads"));
        assert_eq!(s.state(), TaskState::Starting);
    }

    #[test]
    fn test_rerender_called_per_applied_write() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let s: Shared<u8> = Shared::new(
            "test".into(),
            Bus::new(8),
            Some(Arc::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
            })),
        );
        let run = s.begin();
        s.authority.claim(RunSlot::new(run));
        s.transition(run, TaskState::Running);
        s.publish_item(run, 1, 1);
        s.publish_item(run + 1, 1, 2);
        s.complete(run, None);
        // starting, running, item, finished
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }
}
