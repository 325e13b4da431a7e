//! # taskhook
//!
//! **Taskhook** runs work for a reactive renderer off the rendering thread.
//!
//! Given a unit of work (a plain computation or a lazy sequence), a [`TaskHook`]
//! runs it on a dedicated OS thread, exposes its lifecycle as an observable
//! [`TaskState`], supports cooperative mid-execution cancellation, and guarantees
//! that when the dependency key changes only the most recent run's output is
//! ever observed, even while older runs are still finishing.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  render loop (single-threaded)
//!     │ bind(deps) / retry() / cancel()          ▲ state() / value() / error()
//!     ▼                                          │ (polling, never blocks)
//! ┌──────────────────────────────────────────────┴────────────────────┐
//! │  TaskHook (binder)                                                │
//! │  - dependency key + retry counter → lineage token                 │
//! │  - Shared: Authority (hand-off lock) │ ResultCell │ TaskState     │
//! │  - Bus (broadcast events)  ─► SubscriberSet (optional)            │
//! └──────┬──────────────────────────┬─────────────────────────────────┘
//!        ▼ spawn                    ▼ spawn
//!   ┌───────────┐  waits for   ┌───────────┐
//!   │  run #1   │ ◄─────────── │  run #2   │   at most one authoritative run;
//!   │ (thread)  │              │ (thread)  │   non-authoritative runs never write
//!   └───────────┘              └───────────┘
//!        │ Monitor::scope(work) / per-item scope(next)
//!        ▼
//!   user work ── checkpoint()? ── aborts when the lineage token is set
//! ```
//!
//! ### Lifecycle
//! ```text
//! INITIAL ─► STARTING ─► [WAITING] ─► RUNNING ─┬─► FINISHED
//!                                              ├─► ERROR
//!                                              └─► CANCELLED (token set, still authoritative)
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                     |
//! |-------------------|--------------------------------------------------------------------|----------------------------------------|
//! | **Binding**       | Re-run on dependency change, retry, cancel, teardown on drop.      | [`TaskHook`], [`TaskHookBuilder`]      |
//! | **Work**          | Single-shot or lazy-sequence work, optionally token-aware.         | [`Work`], [`ItemStream`]               |
//! | **Observation**   | Poll state/value/error from any thread.                            | [`ResultHandle`], [`TaskResult`]       |
//! | **Cancellation**  | Per-thread step hooks enforcing cancellation at every checkpoint.  | [`checkpoint`], [`Monitor`]            |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom subscribers). | [`Subscribe`], [`Event`]               |
//! | **Errors**        | Typed errors for user work; distinct abort signal.                 | [`TaskError`], [`Cancelled`]           |
//! | **Configuration** | Monitor behaviour, bus capacity, thread naming.                    | [`Config`]                             |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] subscriber backed by `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::{Duration, Instant};
//! use taskhook::{checkpoint, TaskError, TaskHook, TaskState, Work};
//!
//! let work = Work::once_with_token(|_token| {
//!     let mut total = 0_u64;
//!     for n in 0..1_000 {
//!         checkpoint()?;
//!         total += n;
//!     }
//!     Ok::<_, TaskError>(total)
//! });
//!
//! let mut hook: TaskHook<u64, &str> = TaskHook::builder(work).name("sum").build();
//! hook.bind("first");
//!
//! let deadline = Instant::now() + Duration::from_secs(5);
//! while !hook.state().is_terminal() && Instant::now() < deadline {
//!     std::thread::sleep(Duration::from_millis(5));
//! }
//! assert_eq!(hook.state(), TaskState::Finished);
//! assert_eq!(hook.value().as_deref(), Some(&499_500));
//! ```
mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{
    checkpoint, current_hook, install_hook, Config, HookGuard, Monitor, RenderContext, Rerender,
    ResultHandle, StepHook, TaskHook, TaskHookBuilder, TaskResult, TaskState,
    ALLOW_FOREIGN_HOOK_ENV,
};
pub use error::{Cancelled, TaskError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{ItemStream, Work};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
