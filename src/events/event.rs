//! # Lifecycle events emitted by task hooks and their runs.
//!
//! The [`EventKind`] enum classifies event types in two groups:
//! - **State events**: one per applied state transition (starting, waiting, running, terminal states)
//! - **Flow events**: published lazy-sequence items and runs that lost authority
//!
//! The [`Event`] struct carries metadata such as timestamps, hook name, run id and reasons.
//!
//! ## Ordering guarantees
//! `seq` is process-wide and strictly increasing, so events from several hooks can be merged.
//! Events of one run are published in the order the run applied them.
//!
//! ## Example
//! ```rust
//! use taskhook::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::Failed)
//!     .with_task("search")
//!     .with_run(3)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::Failed);
//! assert_eq!(ev.task.as_deref(), Some("search"));
//! assert_eq!(ev.run, Some(3));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::core::TaskState;

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of hook events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === State events ===
    /// A run was requested (state `STARTING`).
    ///
    /// Sets:
    /// - `task`: hook name
    /// - `run`: id of the requested run
    Starting,

    /// The run is waiting for its predecessor thread to stop (state `WAITING`).
    ///
    /// Sets:
    /// - `task`: hook name
    /// - `run`: run id
    Waiting,

    /// User work started executing (state `RUNNING`).
    Running,

    /// Work completed or the lazy sequence was exhausted (state `FINISHED`).
    Finished,

    /// Work failed (state `ERROR`).
    ///
    /// Sets:
    /// - `reason`: error message
    Failed,

    /// The authoritative run observed its own cancellation (state `CANCELLED`).
    Cancelled,

    // === Flow events ===
    /// A lazy-sequence item was published to the result cell.
    ///
    /// Sets:
    /// - `item`: 1-based item index within the run
    ItemPublished,

    /// A run lost authority and exited without further writes.
    ///
    /// Sets:
    /// - `reason`: where the loss was detected
    Superseded,
}

impl EventKind {
    /// Event kind reporting a transition into `state`.
    pub fn for_state(state: TaskState) -> Option<Self> {
        match state {
            TaskState::Initial => None,
            TaskState::Starting => Some(EventKind::Starting),
            TaskState::Waiting => Some(EventKind::Waiting),
            TaskState::Running => Some(EventKind::Running),
            TaskState::Finished => Some(EventKind::Finished),
            TaskState::Error => Some(EventKind::Failed),
            TaskState::Cancelled => Some(EventKind::Cancelled),
        }
    }
}

/// One lifecycle event. Which optional fields are set depends on [`EventKind`].
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide sequence number.
    pub seq: u64,
    /// When the event was created.
    pub at: SystemTime,
    pub kind: EventKind,
    /// Name of the hook that emitted the event.
    pub task: Option<Arc<str>>,
    /// Run id (monotonic per hook, starting from 1).
    pub run: Option<u64>,
    /// Lazy-sequence item index (starting from 1).
    pub item: Option<u64>,
    /// Human-readable reason (errors, supersession details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Stamps a new event with the next sequence number and the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            run: None,
            item: None,
            reason: None,
        }
    }

    /// Attaches a hook name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a run id.
    #[inline]
    pub fn with_run(mut self, run: u64) -> Self {
        self.run = Some(run);
        self
    }

    /// Attaches a lazy-sequence item index.
    #[inline]
    pub fn with_item(mut self, item: u64) -> Self {
        self.item = Some(item);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::Finished | EventKind::Failed | EventKind::Cancelled
        )
    }
}
