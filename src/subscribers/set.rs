//! # SubscriberSet: hook events delivered to async handlers.
//!
//! A hook publishes from plain OS threads, while subscribers are async. The set
//! bridges the two: one listener task drains the hook's [`Bus`](crate::Bus) and
//! hands every event to a bounded lane per subscriber, each served by its own
//! worker task.
//!
//! ```text
//! Bus ──► listen() task ──► emit(&Event)
//!                               ├──► lane "metrics" ─► worker ─► on_event()
//!                               └──► lane "audit"   ─► worker ─► on_event()
//! ```
//!
//! ## Rules
//! - `emit` never waits: a full or closed lane drops the event for that
//!   subscriber only (warn).
//! - Each lane is FIFO. There is no ordering across lanes.
//! - A panicking handler is logged and its worker keeps serving the lane.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{error, warn};

use crate::events::Event;

use super::Subscribe;

/// Sending side of one subscriber's queue.
struct Lane {
    subscriber: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Fan-out of hook events to a fixed list of subscribers.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: Vec<JoinHandle<()>>,
}

fn spawn_worker(
    sub: Arc<dyn Subscribe>,
    mut rx: mpsc::Receiver<Arc<Event>>,
    rt: &Handle,
) -> JoinHandle<()> {
    rt.spawn(async move {
        while let Some(ev) = rx.recv().await {
            let handled = std::panic::AssertUnwindSafe(sub.on_event(&ev))
                .catch_unwind()
                .await;
            if let Err(panic) = handled {
                error!(subscriber = sub.name(), seq = ev.seq, panic = ?panic, "subscriber panicked");
            }
        }
    })
}

impl SubscriberSet {
    /// Opens one lane per subscriber and spawns its worker on `rt`.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, rt: &Handle) -> Self {
        let (lanes, workers) = subs
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let lane = Lane {
                    subscriber: sub.name(),
                    tx,
                };
                (lane, spawn_worker(sub, rx, rt))
            })
            .unzip();
        Self { lanes, workers }
    }

    /// Queues `event` on every lane without waiting.
    pub fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());
        for lane in &self.lanes {
            let reason = match lane.tx.try_send(Arc::clone(&shared)) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "lane full",
                Err(TrySendError::Closed(_)) => "worker gone",
            };
            warn!(subscriber = lane.subscriber, seq = shared.seq, reason, "event dropped");
        }
    }

    /// Forwards every event from `rx` until the bus closes (all hook handles and
    /// runs are gone).
    ///
    /// Runs as a task on `rt`; a lagging listener logs how many events it skipped.
    pub fn listen(self: Arc<Self>, mut rx: broadcast::Receiver<Event>, rt: &Handle) {
        rt.spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => self.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    /// Closes every lane, then waits for the workers to drain them.
    pub async fn shutdown(self) {
        let Self { lanes, workers } = self;
        drop(lanes);
        for worker in workers {
            let _ = worker.await;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}
