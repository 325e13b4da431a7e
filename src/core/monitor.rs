//! # Execution monitor: fine-grained cooperative cancellation.
//!
//! Rust cannot interrupt a thread between arbitrary statements, so the monitor
//! works with explicit step checks:
//!
//! - every thread owns one **step hook** slot (`thread_local!`);
//! - [`checkpoint`] runs the hook installed for the calling thread (no hook = no-op);
//! - [`Monitor::scope`] installs a cancellation hook, performs one step check,
//!   runs the closure, and restores the previous hook on exit (also when unwinding).
//!
//! The runner wraps each user invocation (and each lazy-sequence pull) in a scope,
//! so cancellation lands between items and anywhere user code calls `checkpoint()?`.
//! Framework bookkeeping between those calls is never monitored.
//!
//! ## Foreign hooks
//! ```text
//! allow_foreign_hook = false (default):   [cancel hook]            previous hidden
//! allow_foreign_hook = true:              [cancel hook] ─► [previous hook]
//! ```
//! In both cases the previous hook is reinstalled when the scope ends.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::Cancelled;

thread_local! {
    static STEP_HOOK: RefCell<Option<Rc<dyn StepHook>>> = const { RefCell::new(None) };
}

/// Answers whether the host renderer is in the middle of a render pass.
///
/// Cancellation is suppressed while this returns `true`.
pub trait RenderContext: Send + Sync + 'static {
    /// True while a render pass is active.
    fn is_rendering(&self) -> bool;
}

impl<F> RenderContext for F
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    fn is_rendering(&self) -> bool {
        self()
    }
}

/// A per-thread step hook, invoked by [`checkpoint`].
pub trait StepHook {
    /// Called on every step; `Err` aborts the current work.
    fn on_step(&self) -> Result<(), Cancelled>;
}

/// Runs the step hook installed for the calling thread.
///
/// Returns `Err(Cancelled)` when the current run was cancelled outside of a render
/// pass. Propagate it with `?`; the runner treats it as a silent stop.
///
/// # Example
/// ```
/// use taskhook::{checkpoint, TaskError};
///
/// fn sum(items: &[u64]) -> Result<u64, TaskError> {
///     let mut total = 0;
///     for x in items {
///         checkpoint()?;
///         total += x;
///     }
///     Ok(total)
/// }
///
/// // Outside a monitored scope there is no hook, so this never aborts.
/// assert_eq!(sum(&[1, 2, 3]).unwrap(), 6);
/// ```
pub fn checkpoint() -> Result<(), Cancelled> {
    let hook = STEP_HOOK.with(|slot| slot.borrow().clone());
    match hook {
        Some(hook) => hook.on_step(),
        None => Ok(()),
    }
}

/// Installs `hook` for the calling thread until the returned guard is dropped.
pub fn install_hook(hook: Rc<dyn StepHook>) -> HookGuard {
    let previous = STEP_HOOK.with(|slot| slot.borrow_mut().replace(hook));
    HookGuard { previous }
}

/// Returns the hook currently installed for the calling thread.
pub fn current_hook() -> Option<Rc<dyn StepHook>> {
    STEP_HOOK.with(|slot| slot.borrow().clone())
}

/// Restores the previously installed step hook on drop.
///
/// Not `Send`: it must be dropped on the thread that created it.
#[must_use = "the hook is uninstalled as soon as the guard is dropped"]
pub struct HookGuard {
    previous: Option<Rc<dyn StepHook>>,
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        STEP_HOOK.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Hook that aborts once the lineage token is cancelled.
struct CancelHook {
    token: CancellationToken,
    render: Option<Arc<dyn RenderContext>>,
    foreign: Option<Rc<dyn StepHook>>,
}

impl StepHook for CancelHook {
    fn on_step(&self) -> Result<(), Cancelled> {
        if self.token.is_cancelled() {
            let rendering = self
                .render
                .as_ref()
                .is_some_and(|rc| rc.is_rendering());
            if !rendering {
                return Err(Cancelled);
            }
        }
        match &self.foreign {
            Some(prev) => prev.on_step(),
            None => Ok(()),
        }
    }
}

/// Scoped cancellation enforcement for one lineage.
///
/// ```
/// use taskhook::{checkpoint, Monitor};
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// let monitor = Monitor::new(token.clone());
///
/// assert_eq!(monitor.scope(|| 1 + 1), Ok(2));
///
/// token.cancel();
/// assert!(monitor.scope(|| 1 + 1).is_err());
/// // Outside the scope the hook is gone again.
/// assert!(checkpoint().is_ok());
/// ```
#[derive(Clone)]
pub struct Monitor {
    token: CancellationToken,
    render: Option<Arc<dyn RenderContext>>,
    allow_foreign_hook: bool,
    intrusive: bool,
}

impl Monitor {
    /// Creates an intrusive monitor that overrides foreign hooks.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            render: None,
            allow_foreign_hook: false,
            intrusive: true,
        }
    }

    /// Consults `render` before aborting; without one, aborts unconditionally.
    pub fn with_render_context(mut self, render: Option<Arc<dyn RenderContext>>) -> Self {
        self.render = render;
        self
    }

    /// Compose with (instead of hiding) a hook already installed on the thread.
    pub fn allow_foreign_hook(mut self, allow: bool) -> Self {
        self.allow_foreign_hook = allow;
        self
    }

    /// When `false`, scopes run their closure untouched and never abort.
    pub fn intrusive(mut self, intrusive: bool) -> Self {
        self.intrusive = intrusive;
        self
    }

    /// Token observed by this monitor.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Installs the cancellation hook for the calling thread.
    ///
    /// Returns `None` for a non-intrusive monitor.
    pub fn guard(&self) -> Option<HookGuard> {
        if !self.intrusive {
            return None;
        }
        let foreign = if self.allow_foreign_hook {
            current_hook()
        } else {
            None
        };
        Some(install_hook(Rc::new(CancelHook {
            token: self.token.clone(),
            render: self.render.clone(),
            foreign,
        })))
    }

    /// Runs `f` under the cancellation hook.
    ///
    /// Performs one step check before `f`; `f` itself is interrupted only where it
    /// calls [`checkpoint`].
    pub fn scope<R>(&self, f: impl FnOnce() -> R) -> Result<R, Cancelled> {
        let _guard = self.guard();
        checkpoint()?;
        Ok(f())
    }
}
