//! # User work (`Work`)
//!
//! [`Work`] wraps a closure that is invoked once per run. Two shapes exist:
//!
//! - **single-shot**: the closure returns the value;
//! - **lazy sequence**: the closure returns an iterator whose items are pulled one
//!   at a time, each pull being a separately monitored step.
//!
//! Each shape has a variant that receives the lineage [`CancellationToken`], so
//! work can also poll `is_cancelled()` or hand the token to other APIs.
//!
//! ## Concurrency semantics
//! - Closures are `Fn`, not `FnMut`: every run calls the same closure afresh.
//!   If shared state is needed, capture an `Arc<...>` explicitly.
//! - Cloning a `Work` is cheap (`Arc` inside).
//!
//! ## Example
//! ```rust
//! use taskhook::{checkpoint, TaskError, Work};
//!
//! let answer = Work::once(|| Ok::<_, TaskError>(42));
//!
//! let numbers = Work::stream(|| {
//!     (1..=3).map(|n| {
//!         checkpoint()?;
//!         Ok::<_, TaskError>(n)
//!     })
//! });
//! # let _ = (answer, numbers);
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Iterator produced by lazy-sequence work.
pub type ItemStream<T> = Box<dyn Iterator<Item = Result<T, TaskError>> + Send>;

type OnceFn<T> = dyn Fn(CancellationToken) -> Result<T, TaskError> + Send + Sync;
type StreamFn<T> = dyn Fn(CancellationToken) -> ItemStream<T> + Send + Sync;

enum Kind<T> {
    Once(Arc<OnceFn<T>>),
    Stream(Arc<StreamFn<T>>),
}

/// What one invocation of the work produced.
pub(crate) enum Output<T> {
    Value(T),
    Stream(ItemStream<T>),
}

/// Unit of background work producing values of type `T`.
pub struct Work<T> {
    kind: Kind<T>,
}

impl<T> Clone for Work<T> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            Kind::Once(f) => Kind::Once(Arc::clone(f)),
            Kind::Stream(f) => Kind::Stream(Arc::clone(f)),
        };
        Self { kind }
    }
}

impl<T: Send + 'static> Work<T> {
    /// Single-shot work.
    pub fn once<F>(f: F) -> Self
    where
        F: Fn() -> Result<T, TaskError> + Send + Sync + 'static,
    {
        Self::once_with_token(move |_| f())
    }

    /// Single-shot work that receives the lineage token.
    pub fn once_with_token<F>(f: F) -> Self
    where
        F: Fn(CancellationToken) -> Result<T, TaskError> + Send + Sync + 'static,
    {
        Self {
            kind: Kind::Once(Arc::new(f)),
        }
    }

    /// Lazy-sequence work; every item overwrites the published value.
    pub fn stream<F, I>(f: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Result<T, TaskError>>,
        I::IntoIter: Send + 'static,
    {
        Self::stream_with_token(move |_| f())
    }

    /// Lazy-sequence work that receives the lineage token.
    pub fn stream_with_token<F, I>(f: F) -> Self
    where
        F: Fn(CancellationToken) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Result<T, TaskError>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            kind: Kind::Stream(Arc::new(move |token| {
                Box::new(f(token).into_iter()) as ItemStream<T>
            })),
        }
    }
}

impl<T> Work<T> {
    /// True for lazy-sequence work.
    pub fn is_stream(&self) -> bool {
        matches!(self.kind, Kind::Stream(_))
    }

    /// Calls the closure once. For lazy sequences this only creates the iterator.
    pub(crate) fn invoke(&self, token: CancellationToken) -> Result<Output<T>, TaskError> {
        match &self.kind {
            Kind::Once(f) => f(token).map(Output::Value),
            Kind::Stream(f) => Ok(Output::Stream(f(token))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_once_invokes_each_time() {
        let work = Work::once(|| Ok(7_u8));
        for _ in 0..2 {
            match work.invoke(CancellationToken::new()) {
                Ok(Output::Value(v)) => assert_eq!(v, 7),
                _ => panic!("expected a value"),
            }
        }
        assert!(!work.is_stream());
    }

    #[test]
    fn test_token_is_passed_through() {
        let work = Work::once_with_token(|token| Ok(token.is_cancelled()));
        let token = CancellationToken::new();
        token.cancel();
        match work.invoke(token) {
            Ok(Output::Value(cancelled)) => assert!(cancelled),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn test_stream_is_lazy() {
        let work = Work::stream(|| (1..=3).map(Ok));
        assert!(work.clone().is_stream());
        let items: Vec<u32> = match work.invoke(CancellationToken::new()) {
            Ok(Output::Stream(items)) => items.map(|r| r.unwrap()).collect(),
            _ => panic!("expected a stream"),
        };
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_error_is_returned() {
        let work: Work<u8> = Work::once(|| Err(TaskError::fail("nope")));
        assert!(work.invoke(CancellationToken::new()).is_err());
    }
}
