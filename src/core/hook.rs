//! # TaskHook: binds dependency changes to runs.
//!
//! A [`TaskHook`] is the per-component instance of the primitive. The host calls
//! [`TaskHook::bind`] on every render with the current dependency key; a run is
//! started only when the key (or the retry counter) changed since the previous
//! call.
//!
//! ## Lineages
//! ```text
//! bind(k1) ─► lineage #1 (token t1) ─► run 1
//! bind(k1)    (unchanged, no-op)
//! bind(k2) ─► t1.cancel() ─► lineage #2 (token t2) ─► run 2 (waits for run 1)
//! retry()  ─► t2.cancel() ─► lineage #3 (token t3) ─► run 3
//! drop     ─► t3.cancel()   (threads are detached, never joined)
//! ```
//!
//! ## Rules
//! - One hand-off lock and one result cell per hook, shared by all lineages.
//! - One cancellation token per lineage, never reused.
//! - The caller never blocks: `bind`, `retry` and `cancel` return immediately.

use std::sync::Arc;
use std::thread;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::builder::TaskHookBuilder;
use crate::core::cell::TaskResult;
use crate::core::monitor::{Monitor, RenderContext};
use crate::core::runner::Runner;
use crate::core::shared::{ResultHandle, Shared};
use crate::core::{Config, TaskState};
use crate::error::TaskError;
use crate::events::Event;
use crate::tasks::Work;

/// Background work bound to a dependency key.
///
/// `T` is the value type produced by the work; `K` is the dependency key
/// (any `PartialEq + Clone` value, `()` for "run once").
///
/// ## Example
/// ```rust
/// use std::time::{Duration, Instant};
/// use taskhook::{TaskError, TaskHook, TaskState, Work};
///
/// let mut hook: TaskHook<u64, u64> = TaskHook::new(Work::once(|| Ok::<_, TaskError>(6 * 7)));
/// hook.bind(1);
///
/// let deadline = Instant::now() + Duration::from_secs(5);
/// while hook.state() != TaskState::Finished && Instant::now() < deadline {
///     std::thread::sleep(Duration::from_millis(5));
/// }
/// assert_eq!(hook.value().as_deref(), Some(&42));
/// ```
pub struct TaskHook<T, K = ()> {
    pub(crate) shared: Arc<Shared<T>>,
    pub(crate) work: Work<T>,
    pub(crate) cfg: Config,
    pub(crate) render: Option<Arc<dyn RenderContext>>,
    pub(crate) key: Option<(K, u64)>,
    pub(crate) retries: u64,
    pub(crate) token: CancellationToken,
}

impl<T> TaskHook<T, ()>
where
    T: Send + Sync + 'static,
{
    /// Starts configuring a hook.
    ///
    /// The key type is chosen by [`TaskHookBuilder::build`].
    pub fn builder(work: Work<T>) -> TaskHookBuilder<T> {
        TaskHookBuilder::new(work)
    }

    /// Starts the work once; later calls are no-ops until [`retry`](Self::retry).
    pub fn start(&mut self) -> bool {
        self.bind(())
    }
}

impl<T, K> TaskHook<T, K>
where
    T: Send + Sync + 'static,
    K: PartialEq + Clone,
{
    /// Creates a hook with default configuration.
    pub fn new(work: Work<T>) -> Self {
        TaskHookBuilder::new(work).build()
    }

    /// Starts a new lineage if `deps` (or the retry counter) changed.
    ///
    /// The previous lineage is cancelled first. Returns `true` when a run was started.
    pub fn bind(&mut self, deps: K) -> bool {
        let key = (deps, self.retries);
        if self.key.as_ref() == Some(&key) {
            return false;
        }
        self.token.cancel();
        self.token = CancellationToken::new();
        self.key = Some(key);
        self.run();
        true
    }

    /// Like [`bind`](Self::bind), but runs `work` when the key changed.
    ///
    /// Mirrors a render passing a fresh closure every time: with an unchanged
    /// key the new closure is dropped and the previous one is kept.
    pub fn bind_with(&mut self, deps: K, work: Work<T>) -> bool {
        if self.key.as_ref().map(|(k, r)| (k, *r)) == Some((&deps, self.retries)) {
            return false;
        }
        self.work = work;
        self.bind(deps)
    }

    /// Re-runs the work with the last bound dependencies in a fresh lineage.
    ///
    /// Returns `false` if [`bind`](Self::bind) was never called.
    pub fn retry(&mut self) -> bool {
        self.retries += 1;
        match self.key.as_ref().map(|(deps, _)| deps.clone()) {
            Some(deps) => self.bind(deps),
            None => false,
        }
    }

    fn run(&self) {
        let run = self.shared.begin();
        let monitor = Monitor::new(self.token.clone())
            .with_render_context(self.render.clone())
            .allow_foreign_hook(self.cfg.allow_foreign_hook)
            .intrusive(self.cfg.intrusive_cancel);
        let runner = Runner {
            shared: Arc::clone(&self.shared),
            work: self.work.clone(),
            monitor,
            run,
        };

        info!(task = %self.shared.name, run, "starting thread");
        let spawned = thread::Builder::new()
            .name(format!("{}-{run}", self.cfg.thread_name))
            .spawn(move || runner.run());
        if let Err(err) = spawned {
            self.shared.spawn_failed(run, err);
        }
    }
}

impl<T, K> TaskHook<T, K> {
    /// Cancels the current lineage. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token of the current lineage (e.g. to layer a timeout on top).
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Hook name used in logs, events and thread names.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.shared.state()
    }

    /// Latest published value.
    pub fn value(&self) -> Option<Arc<T>> {
        self.handle().value()
    }

    /// Latest published error.
    pub fn error(&self) -> Option<Arc<TaskError>> {
        self.handle().error()
    }

    /// Value, error and state in one read.
    pub fn result(&self) -> TaskResult<T> {
        self.shared.snapshot()
    }

    /// Cloneable read-only view, usable from other threads.
    pub fn handle(&self) -> ResultHandle<T> {
        ResultHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Receiver for this hook's subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus().subscribe()
    }
}

impl<T, K> Drop for TaskHook<T, K> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn settle<T, K>(hook: &TaskHook<T, K>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !hook.state().is_terminal() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_bind_with_keeps_work_for_unchanged_key() {
        let mut hook: TaskHook<&'static str, u8> = TaskHook::new(Work::once(|| Ok("first")));
        assert!(hook.bind(1));
        settle(&hook);

        assert!(!hook.bind_with(1, Work::once(|| Ok("ignored"))));
        assert!(hook.retry());
        settle(&hook);
        assert_eq!(hook.value().as_deref(), Some(&"first"));

        assert!(hook.bind_with(2, Work::once(|| Ok("second"))));
        settle(&hook);
        assert_eq!(hook.value().as_deref(), Some(&"second"));
    }

    #[test]
    fn test_each_lineage_gets_a_fresh_token() {
        let mut hook: TaskHook<u8, u8> = TaskHook::new(Work::once(|| Ok(0)));
        hook.bind(1);
        let first = hook.token();
        hook.bind(2);
        let second = hook.token();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        drop(hook);
        assert!(second.is_cancelled());
    }

    #[test]
    fn test_worker_threads_are_named() {
        let work = Work::once(|| Ok(thread::current().name().map(str::to_owned)));
        let cfg = Config {
            thread_name: "loader".to_string(),
            ..Config::default()
        };
        let mut hook: TaskHook<Option<String>> = TaskHook::builder(work).config(cfg).build();
        hook.start();
        settle(&hook);
        assert_eq!(
            hook.value().as_deref(),
            Some(&Some("loader-1".to_string()))
        );
    }

    #[test]
    fn test_builder_picks_key_type_at_build() {
        let mut hook: TaskHook<u8, &'static str> = TaskHook::builder(Work::once(|| Ok(9)))
            .name("keyed")
            .build();
        assert_eq!(hook.name(), "keyed");
        assert!(hook.bind("k"));
        settle(&hook);
        assert_eq!(hook.value().as_deref(), Some(&9));
    }
}
