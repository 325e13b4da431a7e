//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and [`SubscriberSet`], the fan-out
//! that delivers hook events (broadcast through the [`Bus`](crate::Bus)) to
//! user-defined handlers.
//!
//! ## Architecture
//! ```text
//! run threads ── publish(Event) ──► Bus ──► listener task ──► SubscriberSet::emit
//!                                                              ├──► [queue] ─► sub1.on_event()
//!                                                              └──► [queue] ─► subN.on_event()
//! ```
//!
//! The listener task runs on the tokio runtime that was current when the hook was
//! built. Without a runtime, subscribers are not wired (a warning is logged).
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use taskhook::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::Failed {
//!             // increment failure counter
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
