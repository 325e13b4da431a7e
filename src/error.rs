//! Error types used by taskhook runs and user work.
//!
//! This module defines:
//!
//! - [`TaskError`]: errors recorded for a run and surfaced through the result cell.
//! - [`Cancelled`]: the abort signal raised by the execution monitor.
//!
//! `TaskError` provides helper methods (`as_label`, `as_message`) for logging/metrics.
//! The abort signal is a separate type: it is never recorded as a run
//! error and never logged at error level.

use std::fmt;

use thiserror::Error;

/// # Abort signal raised by the execution monitor.
///
/// Returned by [`checkpoint`](crate::checkpoint) when the lineage's cancellation
/// token is set and no render pass is active. User work should propagate it with
/// `?` instead of handling it; the invocation boundary recognizes it and falls
/// through to cleanup.
///
/// Converts into [`TaskError::Canceled`] so `?` works inside work returning
/// `Result<T, TaskError>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("work cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// # Errors produced by user work.
///
/// Anything except [`TaskError::Canceled`] ends the run in the `ERROR` state and is
/// stored in the result cell.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Work returned an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Work panicked; the panic was caught at the invocation boundary.
    #[error("work panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text (or a placeholder for non-string payloads).
        message: String,
    },

    /// The worker thread could not be spawned.
    #[error("failed to spawn worker thread: {error}")]
    Spawn {
        /// The OS error message.
        error: String,
    },

    /// Work observed cancellation and stopped early.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Wraps any displayable error as [`TaskError::Fail`].
    ///
    /// # Example
    /// ```
    /// use taskhook::TaskError;
    ///
    /// let err = TaskError::fail("disk full");
    /// assert_eq!(err.to_string(), "execution failed: disk full");
    /// ```
    pub fn fail(error: impl fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Builds a [`TaskError::Panicked`] from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "<non-string panic payload>".to_string()
        };
        TaskError::Panicked { message }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskhook::TaskError;
    ///
    /// let err = TaskError::fail("boom");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Spawn { .. } => "task_spawn_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { message } => format!("panic: {message}"),
            TaskError::Spawn { error } => format!("spawn: {error}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }

    /// True for the graceful cancellation variant.
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }
}

impl From<Cancelled> for TaskError {
    fn from(_: Cancelled) -> Self {
        TaskError::Canceled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_converts_to_canceled() {
        fn work() -> Result<u8, TaskError> {
            Err(Cancelled)?;
            Ok(1)
        }
        assert!(work().unwrap_err().is_canceled());
    }

    #[test]
    fn test_panic_payloads() {
        let err = TaskError::from_panic(Box::new("static"));
        assert_eq!(err.as_message(), "panic: static");

        let err = TaskError::from_panic(Box::new(String::from("owned")));
        assert_eq!(err.as_message(), "panic: owned");

        let err = TaskError::from_panic(Box::new(17_u32));
        assert_eq!(err.as_label(), "task_panicked");
        assert!(err.to_string().contains("non-string"));
    }

    #[test]
    fn test_fail_is_not_canceled() {
        assert!(!TaskError::fail("x").is_canceled());
        assert!(!TaskError::Spawn { error: "x".into() }.is_canceled());
    }
}
