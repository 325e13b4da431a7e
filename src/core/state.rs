//! # Task state machine.
//!
//! ```text
//! INITIAL  ──run triggered──────────────────────► STARTING
//! STARTING ──predecessor still running──────────► WAITING
//! STARTING ──no predecessor─────────────────────► RUNNING
//! WAITING  ──predecessor joined, still current──► RUNNING
//! RUNNING  ──work returned a value / exhausted──► FINISHED
//! RUNNING  ──work returned an error─────────────► ERROR
//! RUNNING  ──aborted, still current at exit─────► CANCELLED
//! ```
//!
//! A new lineage may start from any state, so `STARTING` is reachable from
//! everywhere. A predecessor that is still authoritative when the caller
//! requests a new run may finish after `STARTING` was written, so terminal
//! states are accepted from `STARTING`, and the successor may then move on
//! to `WAITING`/`RUNNING` from that terminal state. `CANCELLED` is written at
//! cleanup only by a run that never wrote `FINISHED`/`ERROR`, so it follows
//! `RUNNING` (or the `STARTING` of a successor requested meanwhile).

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of the current run, as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TaskState {
    /// No run was ever requested.
    #[default]
    Initial = 0,
    /// A run was requested; its thread has not claimed authority yet.
    Starting = 1,
    /// The run is waiting for its predecessor thread to stop.
    Waiting = 2,
    /// User work is executing.
    Running = 3,
    /// Work completed (or the lazy sequence was exhausted).
    Finished = 4,
    /// Work failed; see the result cell's error.
    Error = 5,
    /// The authoritative run observed its own cancellation.
    Cancelled = 6,
}

impl TaskState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskState::Initial => "initial",
            TaskState::Starting => "starting",
            TaskState::Waiting => "waiting",
            TaskState::Running => "running",
            TaskState::Finished => "finished",
            TaskState::Error => "error",
            TaskState::Cancelled => "cancelled",
        }
    }

    /// True for `FINISHED`, `ERROR` and `CANCELLED`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Finished | TaskState::Error | TaskState::Cancelled
        )
    }

    /// True while a run is pending or executing.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TaskState::Starting | TaskState::Waiting | TaskState::Running
        )
    }

    /// Whether `self → next` is a transition the state machine allows.
    pub fn can_transition(&self, next: TaskState) -> bool {
        use TaskState::*;
        match next {
            Initial => false,
            Starting => true,
            Waiting => !matches!(self, Initial | Running),
            Running => !matches!(self, Initial | Running),
            Finished | Error => matches!(self, Starting | Waiting | Running),
            Cancelled => matches!(self, Starting | Running),
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => TaskState::Starting,
            2 => TaskState::Waiting,
            3 => TaskState::Running,
            4 => TaskState::Finished,
            5 => TaskState::Error,
            6 => TaskState::Cancelled,
            _ => TaskState::Initial,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Lock-free holder of the current [`TaskState`].
///
/// Readers never block. Writers are serialized by the caller (hand-off lock).
#[derive(Debug, Default)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn get(&self) -> TaskState {
        TaskState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Stores `next` and returns the previous state.
    pub(crate) fn set(&self, next: TaskState) -> TaskState {
        TaskState::from_u8(self.0.swap(next as u8, Ordering::AcqRel))
    }
}
