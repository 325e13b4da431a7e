//! # Result cell: latest value and error of a hook.
//!
//! Single writer by construction: only the authoritative run writes, and it does
//! so while holding the hand-off lock (see [`Authority`](super::authority::Authority)).
//! The inner `RwLock` exists for memory safety of the `(value, error)` pair, not
//! for writer coordination; observers take only its read side and never block a
//! hand-off.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::TaskState;
use crate::error::TaskError;

struct Slot<T> {
    value: Option<Arc<T>>,
    error: Option<Arc<TaskError>>,
}

/// Shared `(value, error)` slot.
pub(crate) struct ResultCell<T> {
    slot: RwLock<Slot<T>>,
}

impl<T> ResultCell<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: RwLock::new(Slot {
                value: None,
                error: None,
            }),
        }
    }

    /// Overwrites the value and clears the error.
    pub(crate) fn set_value(&self, value: T) {
        let mut slot = self.slot.write();
        slot.value = Some(Arc::new(value));
        slot.error = None;
    }

    /// Records an error, leaving the previous value in place.
    pub(crate) fn set_error(&self, error: TaskError) {
        self.slot.write().error = Some(Arc::new(error));
    }

    pub(crate) fn value(&self) -> Option<Arc<T>> {
        self.slot.read().value.clone()
    }

    pub(crate) fn error(&self) -> Option<Arc<TaskError>> {
        self.slot.read().error.clone()
    }

    /// Reads value and error as one consistent pair.
    pub(crate) fn read(&self) -> (Option<Arc<T>>, Option<Arc<TaskError>>) {
        let slot = self.slot.read();
        (slot.value.clone(), slot.error.clone())
    }
}

/// Point-in-time view of a hook's result.
///
/// `value` may be stale (a previous run's value stays visible while a new run is
/// pending) or intermediate (the latest item of a lazy sequence).
pub struct TaskResult<T> {
    /// Latest published value.
    pub value: Option<Arc<T>>,
    /// Latest published error.
    pub error: Option<Arc<TaskError>>,
    /// Lifecycle state at the time of the read.
    pub state: TaskState,
}

impl<T> TaskResult<T> {
    /// True once the current run completed successfully.
    pub fn is_finished(&self) -> bool {
        self.state == TaskState::Finished
    }

    /// True while a run is pending or executing.
    pub fn is_loading(&self) -> bool {
        self.state.is_active()
    }
}

impl<T> Clone for TaskResult<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            error: self.error.clone(),
            state: self.state,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for TaskResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskResult")
            .field("value", &self.value)
            .field("error", &self.error)
            .field("state", &self.state)
            .finish()
    }
}
