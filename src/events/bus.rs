//! # Event bus for broadcasting hook events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from plain OS threads (the caller of `bind`
//! and every worker thread of the hook).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                 Receivers:
//!   TaskHook::bind ──┐
//!   run #1 thread  ──┼──────► Bus ───────► subscriber listener ────► SubscriberSet
//!   run #2 thread  ──┘  (broadcast chan)  ResultHandle::subscribe() receivers
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks and needs no async runtime.
//! - **Bounded**: one ring buffer of `Config::bus_capacity` events serves every receiver.
//! - **Lagging receivers** see `RecvError::Lagged(n)` and resume after the `n` lost events.
//! - **No persistence**: events are lost if there are no active receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for hook events. Cloning shares the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        // Err only means nobody is listening.
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
