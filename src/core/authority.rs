//! # Authoritative run hand-off.
//!
//! One [`Authority`] exists per hook. It holds the slot of the run that is
//! currently allowed to write the result cell and the state. Every hand-off and
//! every guarded write happens under its mutex:
//!
//! ```text
//! run B thread:  lock ─► predecessor = current; current = B ─► unlock
//!                  └─► predecessor? ─► wait(predecessor) ─► still current? ─► run work
//!
//! guarded write: lock ─► current.id == run? ─► write ─► unlock
//! ```
//!
//! A [`RunSlot`] doubles as a join handle that any number of successors can wait
//! on. Its [`Latch`] fires on drop, so a predecessor that unwinds still releases
//! its waiters.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// Identity and completion latch of one run.
#[derive(Debug)]
pub(crate) struct RunSlot {
    id: u64,
    done: Mutex<bool>,
    stopped: Condvar,
}

impl RunSlot {
    pub(crate) fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id,
            done: Mutex::new(false),
            stopped: Condvar::new(),
        })
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Blocks until the run's thread has finished.
    pub(crate) fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.stopped.wait(&mut done);
        }
    }

    fn finish(&self) {
        *self.done.lock() = true;
        self.stopped.notify_all();
    }

    /// Returns a guard that marks this run finished when dropped.
    pub(crate) fn latch(self: &Arc<Self>) -> Latch {
        Latch(Arc::clone(self))
    }
}

/// Marks its run finished on drop (including unwinding).
pub(crate) struct Latch(Arc<RunSlot>);

impl Drop for Latch {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// The authoritative-run pointer and its mutex.
#[derive(Debug, Default)]
pub(crate) struct Authority {
    current: Mutex<Option<Arc<RunSlot>>>,
}

impl Authority {
    /// Makes `slot` authoritative and returns the slot it replaced.
    pub(crate) fn claim(&self, slot: Arc<RunSlot>) -> Option<Arc<RunSlot>> {
        self.current.lock().replace(slot)
    }

    pub(crate) fn is_current(&self, run: u64) -> bool {
        self.current.lock().as_ref().is_some_and(|s| s.id == run)
    }

    /// Runs `f` under the hand-off lock if `run` is authoritative.
    pub(crate) fn when_current<R>(&self, run: u64, f: impl FnOnce() -> R) -> Option<R> {
        let current = self.current.lock();
        match current.as_ref() {
            Some(slot) if slot.id == run => Some(f()),
            _ => None,
        }
    }

    /// Runs `f` under the hand-off lock if no run is authoritative.
    pub(crate) fn when_idle<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let current = self.current.lock();
        match current.as_ref() {
            None => Some(f()),
            Some(_) => None,
        }
    }

    /// Clears the pointer if `run` is authoritative, then runs `f` under the lock.
    pub(crate) fn release<R>(&self, run: u64, f: impl FnOnce() -> R) -> Option<R> {
        let mut current = self.current.lock();
        match current.as_ref() {
            Some(slot) if slot.id == run => {
                *current = None;
                Some(f())
            }
            _ => None,
        }
    }
}
