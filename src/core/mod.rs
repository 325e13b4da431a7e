//! Hook core: lifecycle, hand-off and cancellation.
//!
//! The public API from this module is [`TaskHook`] (the binder), its
//! [`TaskHookBuilder`], the observer types ([`ResultHandle`], [`TaskResult`],
//! [`TaskState`]), the execution monitor ([`Monitor`], [`checkpoint`]) and
//! [`Config`].
//!
//! Internal modules:
//! - [`authority`]: authoritative-run pointer, hand-off lock, completion latches;
//! - [`cell`]: the `(value, error)` result cell;
//! - [`shared`]: identity-guarded writes, events and re-render notifications;
//! - [`runner`]: body of one run's worker thread;
//! - [`monitor`]: per-thread step hooks and scoped cancellation;
//! - [`hook`]: dependency binding, lineages, spawning.

mod authority;
mod builder;
mod cell;
mod config;
mod hook;
mod monitor;
mod runner;
mod shared;
mod state;

pub use builder::TaskHookBuilder;
pub use cell::TaskResult;
pub use config::{Config, ALLOW_FOREIGN_HOOK_ENV};
pub use hook::TaskHook;
pub use monitor::{checkpoint, current_hook, install_hook, HookGuard, Monitor, RenderContext, StepHook};
pub use shared::{Rerender, ResultHandle};
pub use state::TaskState;
