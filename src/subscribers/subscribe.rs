//! # The `Subscribe` trait
//!
//! Implement [`Subscribe`] to react to a hook's lifecycle events (metrics,
//! audit trails, UI bridges). Handlers run on tokio worker tasks fed by the
//! [`SubscriberSet`](crate::SubscriberSet), never on the hook's worker threads,
//! so a slow handler cannot delay a run.
//!
//! ## Rules
//! - Events reach a handler in publication order.
//! - A handler that falls behind by more than [`Subscribe::queue_capacity`]
//!   events loses the overflow (logged at warn level).

use async_trait::async_trait;

use crate::events::Event;

/// Async handler for hook events.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes one event. Avoid blocking the runtime here.
    async fn on_event(&self, event: &Event);

    /// Name used in log records about this subscriber.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Bound of this subscriber's queue (clamped to at least 1).
    fn queue_capacity(&self) -> usize {
        256
    }
}
