//! Interruption regions.
//!
//! A region runs an effect with a given [`InterruptStatus`] pushed onto the
//! calling fiber's status stack. Interruptible regions race the effect
//! against interrupt delivery; uninterruptible regions let it run to
//! completion and leave any request pending for the enclosing region.
//!
//! Outside any fiber regions are transparent.
//!
//! # Example
//!
//! ```rust,ignore
//! use reservoir::effect::prelude::*;
//!
//! // `commit` always finishes once started, but the caller may still be
//! // interrupted while waiting for the lock.
//! let effect = uninterruptible_mask(|restore| {
//!     restore.apply(acquire_lock()).and_then(|lock| commit(lock))
//! });
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::effect::trait_def::Effect;
use crate::exit::{Defect, Exit};
use crate::fiber::FiberContext;
use crate::interrupt::InterruptStatus;

/// Run `future` inside a region with the given status.
///
/// The region's guard is released on every path, including when the
/// returned future is dropped part way through.
pub(crate) async fn run_region<F, T, E>(status: InterruptStatus, future: F) -> Exit<T, E>
where
    F: Future<Output = Exit<T, E>> + Send,
{
    if status.is_uninterruptible() {
        let exit = run_masked(future).await;
        return honor_pending(exit);
    }
    let Some(ctx) = FiberContext::current() else {
        return future.await;
    };

    let guard = ctx.enter(InterruptStatus::Interruptible);
    let depth = guard.depth();
    let exit = tokio::select! {
        biased;
        by = ctx.interrupt_delivered(depth) => {
            tracing::debug!(fiber = %ctx.id(), by = %by, depth, "interrupt delivered");
            Exit::interrupt(by)
        }
        exit = future => exit,
    };
    drop(guard);
    exit
}

/// Finish a masked region, delivering an interrupt recorded while it ran.
///
/// Called once the mask has been popped: if the restored region is
/// interruptible, a successful exit is replaced by the pending interrupt.
/// Failures keep their cause and the interrupt stays recorded for the next
/// interruptible region.
pub(crate) fn honor_pending<T, E>(exit: Exit<T, E>) -> Exit<T, E> {
    let Some(ctx) = FiberContext::current() else {
        return exit;
    };
    match ctx.deliverable() {
        Some(by) if exit.is_success() => {
            tracing::debug!(fiber = %ctx.id(), by = %by, "interrupt delivered on unmask");
            Exit::interrupt(by)
        }
        _ => exit,
    }
}

/// Run `future` inside an uninterruptible region.
pub(crate) async fn run_masked<F: Future>(future: F) -> F::Output {
    let Some(ctx) = FiberContext::current() else {
        return future.await;
    };
    let _guard = ctx.enter(InterruptStatus::Uninterruptible);
    future.await
}

/// Turn a panic raised while polling `future` into a defect.
pub(crate) async fn catch_defect<F, T, E>(future: F) -> Exit<T, E>
where
    F: Future<Output = Exit<T, E>> + Send,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(exit) => exit,
        Err(payload) => Exit::die(Defect::from_panic(payload)),
    }
}

/// The status of the region the calling code runs in.
pub(crate) fn ambient_status() -> InterruptStatus {
    FiberContext::current()
        .map(|ctx| ctx.status())
        .unwrap_or_default()
}

/// An effect run inside a region with a fixed [`InterruptStatus`].
///
/// Created by [`interruptible`], [`uninterruptible`], [`Restore::apply`] and
/// the matching `EffectExt` methods.
pub struct Region<Inner> {
    pub(crate) inner: Inner,
    pub(crate) status: InterruptStatus,
}

impl<Inner> std::fmt::Debug for Region<Inner> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("inner", &"<effect>")
            .field("status", &self.status)
            .finish()
    }
}

impl<Inner: Effect> Effect for Region<Inner> {
    type Output = Inner::Output;
    type Error = Inner::Error;
    type Env = Inner::Env;

    async fn run(self, env: &Self::Env) -> Exit<Self::Output, Self::Error> {
        run_region(self.status, self.inner.run(env)).await
    }
}

/// Run `effect` in an interruptible region.
///
/// A pending interrupt is delivered as soon as the region is entered.
pub fn interruptible<Eff: Effect>(effect: Eff) -> Region<Eff> {
    Region {
        inner: effect,
        status: InterruptStatus::Interruptible,
    }
}

/// Run `effect` in an uninterruptible region.
///
/// Interrupt requests that arrive meanwhile are recorded and delivered once
/// an interruptible region is on top of the stack again.
pub fn uninterruptible<Eff: Effect>(effect: Eff) -> Region<Eff> {
    Region {
        inner: effect,
        status: InterruptStatus::Uninterruptible,
    }
}

/// Restores the status that was in effect when an
/// [`uninterruptible_mask`] was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restore {
    status: InterruptStatus,
}

impl Restore {
    /// Run `effect` with the captured status.
    pub fn apply<Eff: Effect>(&self, effect: Eff) -> Region<Eff> {
        Region {
            inner: effect,
            status: self.status,
        }
    }

    /// The captured status.
    pub fn status(&self) -> InterruptStatus {
        self.status
    }
}

/// Effect created by [`uninterruptible_mask`].
pub struct UninterruptibleMask<F> {
    pub(crate) f: F,
}

impl<F> std::fmt::Debug for UninterruptibleMask<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UninterruptibleMask")
            .field("f", &"<function>")
            .finish()
    }
}

impl<F, Eff> Effect for UninterruptibleMask<F>
where
    F: FnOnce(Restore) -> Eff + Send,
    Eff: Effect,
{
    type Output = Eff::Output;
    type Error = Eff::Error;
    type Env = Eff::Env;

    async fn run(self, env: &Self::Env) -> Exit<Self::Output, Self::Error> {
        let restore = Restore {
            status: ambient_status(),
        };
        let effect = (self.f)(restore);
        run_region(InterruptStatus::Uninterruptible, effect.run(env)).await
    }
}

/// Run the effect built by `f` uninterruptibly, handing it a [`Restore`]
/// that re-enters the caller's status for the parts that may be cancelled.
pub fn uninterruptible_mask<F, Eff>(f: F) -> UninterruptibleMask<F>
where
    F: FnOnce(Restore) -> Eff + Send,
    Eff: Effect,
{
    UninterruptibleMask { f }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::effect::constructors::{check_interruptible, from_async, from_fn, pure};
    use crate::effect::ext::EffectExt;
    use crate::fiber::{fork, FiberId};
    use crate::testing::Latch;
    use crate::interrupt::InterruptStatus::{Interruptible, Uninterruptible};

    #[tokio::test]
    async fn regions_are_transparent_outside_fibers() {
        let exit = run_region::<_, _, String>(Interruptible, async { Exit::Success(1) }).await;
        assert_eq!(exit, Exit::Success(1));
        assert!(FiberContext::current().is_none());
    }

    #[tokio::test]
    async fn nested_regions_report_their_own_status() {
        let effect = uninterruptible(
            check_interruptible::<String, ()>()
                .and_then(|outer| interruptible(check_interruptible()).map(move |inner| (outer, inner))),
        )
        .and_then(|pair| check_interruptible().map(move |after| (pair, after)));

        let exit = effect.execute(&()).await;
        assert_eq!(exit, Exit::Success(((Uninterruptible, Interruptible), Interruptible)));
    }

    #[tokio::test]
    async fn entering_an_interruptible_region_delivers_a_pending_interrupt() {
        let ctx = FiberContext::new(None);
        ctx.interrupt(FiberId::NONE);
        let exit = Arc::clone(&ctx)
            .scope(run_region::<_, i32, String>(Interruptible, async { Exit::Success(1) }))
            .await;
        assert_eq!(exit, Exit::interrupt(FiberId::NONE));
        assert_eq!(ctx.region_depth(), 0);
    }

    #[tokio::test]
    async fn uninterruptible_region_completes_despite_a_pending_interrupt() {
        let ctx = FiberContext::new(None);
        ctx.interrupt(FiberId::NONE);
        let exit = Arc::clone(&ctx)
            .scope(run_region::<_, i32, String>(Uninterruptible, async { Exit::Success(1) }))
            .await;
        assert_eq!(exit, Exit::Success(1));
        assert!(ctx.is_interrupted());
    }

    #[tokio::test]
    async fn interrupt_recorded_under_a_mask_lands_when_the_mask_lifts() {
        let started = Latch::new();
        let finish = Latch::new();
        let effect = {
            let started = started.clone();
            let finish = finish.clone();
            uninterruptible(from_async(move |_: &()| async move {
                started.open();
                finish.wait().await;
                Ok::<_, String>("done")
            }))
        };

        let fiber = fork(effect, &());
        started.wait().await;
        fiber.interrupt_fork();
        finish.open();

        assert_eq!(fiber.join().await, Exit::interrupt(FiberId::NONE));
    }

    #[tokio::test]
    async fn mask_lifted_inside_a_region_delivers_before_the_next_step() {
        let ctx = FiberContext::new(None);
        let inner_ctx = Arc::clone(&ctx);
        let effect = uninterruptible(from_fn(move |_: &()| {
            inner_ctx.interrupt(FiberId::NONE);
            Ok::<_, String>(1)
        }))
        .map(|n| n + 1);

        let exit = Arc::clone(&ctx)
            .scope(run_region(Interruptible, effect.run(&())))
            .await;
        assert_eq!(exit, Exit::interrupt(FiberId::NONE));
        assert_eq!(ctx.region_depth(), 0);
    }

    #[tokio::test]
    async fn failures_keep_their_cause_when_an_interrupt_is_pending() {
        let ctx = FiberContext::new(None);
        let inner_ctx = Arc::clone(&ctx);
        let effect = uninterruptible(from_fn(move |_: &()| {
            inner_ctx.interrupt(FiberId::NONE);
            Err::<i32, _>("rejected".to_string())
        }));

        let exit = Arc::clone(&ctx)
            .scope(run_region(Interruptible, effect.run(&())))
            .await;
        assert_eq!(exit, Exit::fail("rejected".to_string()));
        assert!(ctx.is_interrupted());
    }

    #[tokio::test]
    async fn mask_restores_the_callers_status() {
        let effect = uninterruptible_mask(|restore| {
            let captured = restore.status();
            check_interruptible::<String, ()>().and_then(move |masked| {
                restore
                    .apply(check_interruptible())
                    .map(move |restored| (captured, masked, restored))
            })
        });
        let exit = effect.execute(&()).await;
        assert_eq!(exit, Exit::Success((Interruptible, Uninterruptible, Interruptible)));
    }

    #[tokio::test]
    async fn mask_inside_uninterruptible_restores_uninterruptible() {
        let effect = uninterruptible(uninterruptible_mask(|restore| {
            restore.apply(check_interruptible::<String, ()>())
        }));
        assert_eq!(effect.execute(&()).await, Exit::Success(Uninterruptible));
    }

    #[tokio::test]
    async fn panics_become_defects() {
        let exit = catch_defect::<_, i32, String>(async {
            if true {
                panic!("exploded");
            }
            Exit::Success(1)
        })
        .await;
        let cause = exit.cause().expect("expected failure");
        assert_eq!(cause.defects()[0].message(), "exploded");
    }

    #[tokio::test]
    async fn pure_values_pass_through_regions() {
        let exit = interruptible(pure::<_, String, ()>(5)).execute(&()).await;
        assert_eq!(exit, Exit::Success(5));
    }
}
