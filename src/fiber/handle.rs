//! Forking, interrupting and joining fibers.
//!
//! A fiber is a tokio task with its own [`FiberContext`]. Its initial
//! interrupt status is inherited from the forking fiber (interruptible when
//! forked from plain async code) unless the [`Builder`] overrides it.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::effect::region::{ambient_status, catch_defect, run_region};
use crate::effect::trait_def::Effect;
use crate::exit::{Defect, Exit};
use crate::fiber::context::FiberContext;
use crate::fiber::id::FiberId;
use crate::interrupt::InterruptStatus;

/// Handle to a running fiber.
///
/// Dropping the handle detaches the fiber; it keeps running.
pub struct Fiber<T, E> {
    context: Arc<FiberContext>,
    handle: JoinHandle<Exit<T, E>>,
}

impl<T, E> std::fmt::Debug for Fiber<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fiber")
            .field("id", &self.context.id())
            .field("name", &self.context.name())
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

impl<T, E> Fiber<T, E> {
    /// The fiber's id.
    pub fn id(&self) -> FiberId {
        self.context.id()
    }

    /// The fiber's interruption state.
    pub fn context(&self) -> &Arc<FiberContext> {
        &self.context
    }

    /// Returns `true` once the fiber has produced its exit.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Request interruption without waiting for the fiber to finish.
    ///
    /// The caller's fiber id (or [`FiberId::NONE`]) is recorded as the
    /// canceller.
    pub fn interrupt_fork(&self) {
        self.context.interrupt(FiberContext::current_id());
    }

    /// Request interruption and wait for the fiber's exit.
    ///
    /// The fiber finishes any uninterruptible work first, so every finalizer
    /// it owns has run by the time this returns.
    pub async fn interrupt(self) -> Exit<T, E> {
        self.interrupt_fork();
        self.join().await
    }

    /// Wait for the fiber's exit.
    ///
    /// A panic that escaped the fiber is reported as a defect; an aborted task
    /// as an interruption by [`FiberId::NONE`].
    pub async fn join(self) -> Exit<T, E> {
        match self.handle.await {
            Ok(exit) => exit,
            Err(err) if err.is_panic() => Exit::die(Defect::from_panic(err.into_panic())),
            Err(_) => Exit::interrupt(FiberId::NONE),
        }
    }
}

/// Configures a fiber before forking it.
///
/// # Example
///
/// ```rust,ignore
/// use reservoir::fiber::Builder;
/// use reservoir::InterruptStatus;
///
/// let fiber = Builder::new()
///     .name("flusher")
///     .interrupt_status(InterruptStatus::Uninterruptible)
///     .fork(flush_all(), &env);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    name: Option<String>,
    interrupt_status: Option<InterruptStatus>,
}

impl Builder {
    /// A builder with no name and an inherited interrupt status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the fiber. The name shows up in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Start the fiber with `status` instead of inheriting the caller's.
    pub fn interrupt_status(mut self, status: InterruptStatus) -> Self {
        self.interrupt_status = Some(status);
        self
    }

    /// Spawn `effect` as a new fiber on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, like `tokio::spawn`.
    pub fn fork<Eff>(self, effect: Eff, env: &Eff::Env) -> Fiber<Eff::Output, Eff::Error>
    where
        Eff: Effect + 'static,
        Eff::Output: 'static,
        Eff::Error: 'static,
        Eff::Env: 'static,
    {
        let status = self.interrupt_status.unwrap_or_else(ambient_status);
        let context = FiberContext::new(self.name);
        let env = env.clone();
        let task_context = Arc::clone(&context);
        let handle =
            tokio::spawn(async move { run_fiber(task_context, status, effect, &env).await });
        Fiber { context, handle }
    }
}

/// Fork `effect` with default settings.
///
/// See [`Builder::fork`].
pub fn fork<Eff>(effect: Eff, env: &Eff::Env) -> Fiber<Eff::Output, Eff::Error>
where
    Eff: Effect + 'static,
    Eff::Output: 'static,
    Eff::Error: 'static,
    Eff::Env: 'static,
{
    Builder::new().fork(effect, env)
}

async fn run_fiber<Eff: Effect>(
    context: Arc<FiberContext>,
    status: InterruptStatus,
    effect: Eff,
    env: &Eff::Env,
) -> Exit<Eff::Output, Eff::Error> {
    let id = context.id();
    tracing::debug!(fiber = %id, name = ?context.name(), status = %status, "fiber started");

    let exit = context
        .scope(catch_defect(run_region(status, effect.run(env))))
        .await;

    tracing::debug!(
        fiber = %id,
        success = exit.is_success(),
        interrupted = exit.is_interrupted(),
        "fiber finished"
    );
    exit
}

/// Run `effect` in the calling task, as a new root fiber unless one is
/// already installed.
pub(crate) async fn run_root<Eff: Effect>(
    effect: Eff,
    env: &Eff::Env,
) -> Exit<Eff::Output, Eff::Error> {
    if FiberContext::current().is_some() {
        return catch_defect(effect.run(env)).await;
    }
    run_fiber(FiberContext::new(None), InterruptStatus::Interruptible, effect, env).await
}
