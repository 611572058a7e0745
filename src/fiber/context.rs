//! Per-fiber interruption state.
//!
//! Each fiber owns a [`FiberContext`] holding its stack of
//! [`InterruptStatus`] values and the interrupt request recorded against it.
//! Regions push onto the stack through [`RegionGuard`]s, which restore the
//! previous status when dropped - on completion, on failure, when the region's
//! future is dropped by an interruption, and while unwinding from a panic.
//!
//! Interrupt requests are sticky: the first canceller is remembered and the
//! request is delivered to the innermost region as soon as that region is
//! interruptible.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::fiber::id::FiberId;
use crate::interrupt::InterruptStatus;

tokio::task_local! {
    static CURRENT_FIBER: Arc<FiberContext>;
}

#[derive(Debug, Default)]
struct RegionState {
    stack: Vec<InterruptStatus>,
    interrupted_by: Option<FiberId>,
}

/// Interruption state of a single fiber.
#[derive(Debug)]
pub struct FiberContext {
    id: FiberId,
    name: Option<String>,
    state: Mutex<RegionState>,
    notify: Notify,
}

impl FiberContext {
    pub(crate) fn new(name: Option<String>) -> Arc<Self> {
        Arc::new(FiberContext {
            id: FiberId::next(),
            name,
            state: Mutex::new(RegionState::default()),
            notify: Notify::new(),
        })
    }

    /// The context of the fiber running the calling code, if any.
    pub fn current() -> Option<Arc<FiberContext>> {
        CURRENT_FIBER.try_with(Arc::clone).ok()
    }

    /// Id of the calling fiber, or [`FiberId::NONE`] outside any fiber.
    pub fn current_id() -> FiberId {
        CURRENT_FIBER
            .try_with(|ctx| ctx.id)
            .unwrap_or(FiberId::NONE)
    }

    /// Run `future` with this context installed as the current fiber.
    pub(crate) fn scope<F>(self: Arc<Self>, future: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        CURRENT_FIBER.scope(self, future)
    }

    /// This fiber's id.
    pub fn id(&self) -> FiberId {
        self.id
    }

    /// This fiber's name, if one was given at fork time.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Status at the top of the region stack.
    ///
    /// A fiber outside any region is interruptible.
    pub fn status(&self) -> InterruptStatus {
        self.state.lock().stack.last().copied().unwrap_or_default()
    }

    /// Number of regions currently entered.
    pub fn region_depth(&self) -> usize {
        self.state.lock().stack.len()
    }

    /// Returns `true` once an interrupt has been requested.
    ///
    /// The request may not have been delivered yet if the fiber is inside an
    /// uninterruptible region.
    pub fn is_interrupted(&self) -> bool {
        self.state.lock().interrupted_by.is_some()
    }

    /// The fiber that first requested interruption, if any.
    pub fn interrupter(&self) -> Option<FiberId> {
        self.state.lock().interrupted_by
    }

    /// Record an interrupt request issued by `by`.
    ///
    /// Never fails and is never lost: while the fiber is uninterruptible the
    /// request stays recorded and is delivered once an interruptible region is
    /// on top of the stack.
    pub fn interrupt(&self, by: FiberId) {
        let first = {
            let mut state = self.state.lock();
            let first = state.interrupted_by.is_none();
            if first {
                state.interrupted_by = Some(by);
            }
            first
        };
        if first {
            tracing::debug!(fiber = %self.id, by = %by, status = %self.status(), "interrupt requested");
        }
        self.notify.notify_waiters();
    }

    /// Push `status` and return the guard that pops it.
    pub(crate) fn enter(self: &Arc<Self>, status: InterruptStatus) -> RegionGuard {
        let depth = {
            let mut state = self.state.lock();
            state.stack.push(status);
            state.stack.len()
        };
        self.notify.notify_waiters();
        RegionGuard {
            ctx: Arc::clone(self),
            depth,
        }
    }

    /// Resolves with the canceller once an interrupt can be delivered to the
    /// region at `depth`.
    ///
    /// Only the innermost region receives interrupts, and only while it is
    /// interruptible; waiters are re-checked on every push, pop and request.
    pub(crate) async fn interrupt_delivered(&self, depth: usize) -> FiberId {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(by) = self.deliverable_at(depth) {
                return by;
            }
            notified.await;
        }
    }

    /// The pending interrupt, if the region on top of the stack can take it.
    pub(crate) fn deliverable(&self) -> Option<FiberId> {
        let depth = self.state.lock().stack.len();
        self.deliverable_at(depth)
    }

    fn deliverable_at(&self, depth: usize) -> Option<FiberId> {
        let state = self.state.lock();
        let innermost = state.stack.len() == depth;
        let interruptible = state
            .stack
            .last()
            .is_some_and(|status| status.is_interruptible());
        if innermost && interruptible {
            state.interrupted_by
        } else {
            None
        }
    }
}

/// Scoped membership in a region; dropping it restores the previous status.
#[derive(Debug)]
pub(crate) struct RegionGuard {
    ctx: Arc<FiberContext>,
    depth: usize,
}

impl RegionGuard {
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}

impl Drop for RegionGuard {
    fn drop(&mut self) {
        // Truncate rather than pop: nested guards of a dropped future may be
        // released in any order.
        self.ctx.state.lock().stack.truncate(self.depth - 1);
        self.ctx.notify.notify_waiters();
    }
}
