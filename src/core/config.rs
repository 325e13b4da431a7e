//! # Hook configuration.
//!
//! Provides [`Config`], the settings shared by a [`TaskHook`](crate::TaskHook),
//! its execution monitor, and its event bus.
//!
//! The process-wide "allow foreign step hook" toggle is read by
//! [`Config::from_env`] and then travels as an ordinary field; the monitor never
//! consults the environment itself.

use std::env;

/// Environment variable read by [`Config::from_env`].
pub const ALLOW_FOREIGN_HOOK_ENV: &str = "TASKHOOK_ALLOW_FOREIGN_HOOK";

/// Configuration for a task hook.
///
/// ## Field semantics
/// - `intrusive_cancel`: install the execution monitor around user work
/// - `allow_foreign_hook`: compose with a step hook already installed on the worker thread
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `thread_name`: prefix of worker thread names (`{thread_name}-{run}`)
#[derive(Clone, Debug)]
pub struct Config {
    /// Enforce cancellation at every monitored step.
    ///
    /// - `true` = user work aborts at the next [`checkpoint`](crate::checkpoint)
    ///   (and between lazy-sequence items) once the lineage is cancelled
    /// - `false` = cancellation is visible only through the token handed to the work
    pub intrusive_cancel: bool,

    /// Compose with a pre-existing step hook instead of overriding it.
    ///
    /// Mixing hooks is unsafe in general, so the default hides foreign hooks
    /// for the duration of each monitored step.
    pub allow_foreign_hook: bool,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Prefix for worker thread names.
    pub thread_name: String,
}

impl Config {
    /// Default configuration with `allow_foreign_hook` taken from
    /// [`ALLOW_FOREIGN_HOOK_ENV`] (`1`, `true` or `True` enable it).
    pub fn from_env() -> Self {
        let allow = env::var(ALLOW_FOREIGN_HOOK_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Self {
            allow_foreign_hook: allow,
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `intrusive_cancel = true`
    /// - `allow_foreign_hook = false`
    /// - `bus_capacity = 1024`
    /// - `thread_name = "taskhook"`
    fn default() -> Self {
        Self {
            intrusive_cancel: true,
            allow_foreign_hook: false,
            bus_capacity: 1024,
            thread_name: "taskhook".to_string(),
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "True")
}
