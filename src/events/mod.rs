//! Hook events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by a [`TaskHook`](crate::TaskHook)
//! and its worker threads.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `TaskHook::bind` (run requested) and the runner threads
//!   (every guarded transition, published items, supersession).
//! - **Consumers**: the subscriber listener (fans out to `SubscriberSet`) and any
//!   receiver obtained from `ResultHandle::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
