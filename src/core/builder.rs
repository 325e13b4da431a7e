use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    core::{Config, RenderContext, Rerender},
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
    tasks::Work,
};

use super::{hook::TaskHook, shared::Shared};

/// Builder for constructing a [`TaskHook`] with optional collaborators.
pub struct TaskHookBuilder<T> {
    work: Work<T>,
    name: String,
    cfg: Config,
    render: Option<Arc<dyn RenderContext>>,
    rerender: Option<Arc<dyn Rerender>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<T> TaskHookBuilder<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a new builder for `work` with default configuration.
    pub fn new(work: Work<T>) -> Self {
        Self {
            work,
            name: "task".to_string(),
            cfg: Config::default(),
            render: None,
            rerender: None,
            subscribers: Vec::new(),
        }
    }

    /// Name used in logs, events and worker thread names.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the configuration.
    pub fn config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Render-pass query consulted before aborting user work.
    pub fn render_context(mut self, render: Arc<dyn RenderContext>) -> Self {
        self.render = Some(render);
        self
    }

    /// Callback asking the host to render again after every observable change.
    pub fn rerender(mut self, rerender: Arc<dyn Rerender>) -> Self {
        self.rerender = Some(rerender);
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive hook events through dedicated workers with bounded
    /// queues, spawned on the tokio runtime current at [`build`](Self::build).
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the hook. No run is started until the first `bind`.
    pub fn build<K>(self) -> TaskHook<T, K>
    where
        K: PartialEq + Clone,
    {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        if !self.subscribers.is_empty() {
            match Handle::try_current() {
                Ok(rt) => {
                    let set = Arc::new(SubscriberSet::new(self.subscribers, &rt));
                    set.listen(bus.subscribe(), &rt);
                }
                Err(_) => {
                    warn!(task = %self.name, "no tokio runtime; subscribers disabled");
                }
            }
        }

        let shared = Arc::new(Shared::new(self.name.into(), bus, self.rerender));
        TaskHook {
            shared,
            work: self.work,
            cfg: self.cfg,
            render: self.render,
            key: None,
            retries: 0,
            token: CancellationToken::new(),
        }
    }
}
