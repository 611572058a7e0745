//! Reservations: an acquire step paired with an exit-aware release.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use crate::effect::boxed::BoxFuture;
use crate::effect::region::{catch_defect, run_region};
use crate::effect::trait_def::Effect;
use crate::exit::{Defect, Exit};
use crate::interrupt::InterruptStatus;
use crate::managed::scope::ReleaseScope;
use crate::managed::Managed;

/// An acquire effect and the release that undoes it.
///
/// The release runs only when acquire produced a value, exactly once, and
/// receives the exit of the code that used the value. Acquire runs with the
/// status the caller had when it entered
/// [`with`](crate::managed::ManagedExt::with), unless
/// [`with_status`](Reservation::with_status) fixes one.
///
/// # Example
///
/// ```rust,ignore
/// use reservoir::prelude::*;
///
/// let reservation = Reservation::new(connect(addr), |conn, exit: &Exit<(), NetError>| {
///     let graceful = exit.is_success();
///     async move { conn.close(graceful).await }
/// });
/// ```
pub struct Reservation<Acq, Rel> {
    acquire: Acq,
    release: Rel,
    status: Option<InterruptStatus>,
}

impl<Acq, Rel> std::fmt::Debug for Reservation<Acq, Rel> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("acquire", &"<effect>")
            .field("release", &"<function>")
            .field("status", &self.status)
            .finish()
    }
}

impl<Acq, Rel> Reservation<Acq, Rel> {
    /// Pair `acquire` with `release`. Acquire inherits the caller's status.
    pub fn new(acquire: Acq, release: Rel) -> Self {
        Reservation {
            acquire,
            release,
            status: None,
        }
    }

    /// Run acquire with `status` regardless of the caller's.
    pub fn with_status(mut self, status: InterruptStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Run acquire uninterruptibly.
    pub fn uninterruptible(self) -> Self {
        self.with_status(InterruptStatus::Uninterruptible)
    }

    /// The status acquire runs with, or `None` when it is inherited.
    pub fn status(&self) -> Option<InterruptStatus> {
        self.status
    }
}

impl<Acq, Rel, Fut> Managed for Reservation<Acq, Rel>
where
    Acq: Effect,
    Acq::Output: 'static,
    Acq::Error: 'static,
    Rel: FnOnce(Acq::Output, &Exit<(), Acq::Error>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    type Output = Acq::Output;
    type Error = Acq::Error;
    type Env = Acq::Env;

    async fn reserve<K, F>(
        self,
        env: &Self::Env,
        scope: &ReleaseScope<Self::Error>,
        k: F,
    ) -> Exit<K, Self::Error>
    where
        F: FnOnce(&Self::Output) -> K + Send,
        K: Send,
    {
        let Reservation {
            acquire,
            release,
            status,
        } = self;
        let status = status.unwrap_or_else(|| scope.ambient());
        let slot = scope.register();

        match catch_defect(run_region(status, acquire.run(env))).await {
            Exit::Success(resource) => {
                let continued = std::panic::catch_unwind(AssertUnwindSafe(|| k(&resource)));
                slot.bind(move |exit: &Exit<(), Acq::Error>| -> BoxFuture<'static, ()> {
                    Box::pin(release(resource, exit))
                });
                match continued {
                    Ok(value) => Exit::Success(value),
                    Err(payload) => Exit::die(Defect::from_panic(payload)),
                }
            }
            Exit::Failure(cause) => {
                tracing::debug!(
                    interrupted = cause.is_interrupted(),
                    "acquire did not produce a resource"
                );
                slot.vacate();
                Exit::Failure(cause)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::effect::constructors::{check_interruptible, fail, from_fn, pure};
    use crate::fiber::FiberContext;
    use crate::testing::EventLog;

    fn logged_release(
        log: &EventLog,
    ) -> impl FnOnce(&'static str, &Exit<(), String>) -> std::future::Ready<()> + Send + 'static {
        let log = log.clone();
        move |name: &'static str, exit: &Exit<(), String>| {
            let outcome = if exit.is_success() { "success" } else { "failure" };
            log.push(format!("release {} after {}", name, outcome));
            std::future::ready(())
        }
    }

    #[test]
    fn builder_sets_status() {
        let reservation =
            Reservation::new(pure::<_, String, ()>(1), |_: i32, _: &Exit<(), String>| async {});
        assert_eq!(reservation.status(), None);
        assert_eq!(
            reservation.uninterruptible().status(),
            Some(InterruptStatus::Uninterruptible)
        );
    }

    #[tokio::test]
    async fn acquire_inherits_the_scope_status_unless_overridden() {
        let release = |_: InterruptStatus, _: &Exit<(), String>| async {};
        let masked = ReleaseScope::with_ambient(InterruptStatus::Uninterruptible);
        let ctx = FiberContext::new(None);

        let inherited = Arc::clone(&ctx)
            .scope(
                Reservation::new(check_interruptible::<String, ()>(), release)
                    .reserve(&(), &masked, |status| *status),
            )
            .await;
        assert_eq!(inherited, Exit::Success(InterruptStatus::Uninterruptible));

        let overridden = Arc::clone(&ctx)
            .scope(
                Reservation::new(check_interruptible::<String, ()>(), release)
                    .with_status(InterruptStatus::Interruptible)
                    .reserve(&(), &masked, |status| *status),
            )
            .await;
        assert_eq!(overridden, Exit::Success(InterruptStatus::Interruptible));
        masked.release_all(Exit::Success(())).await;
    }

    #[tokio::test]
    async fn successful_acquire_binds_the_finalizer() {
        let log = EventLog::new();
        let scope = ReleaseScope::new();
        let reservation = Reservation::new(pure::<_, String, ()>("db"), logged_release(&log));

        let exit = reservation.reserve(&(), &scope, |name| name.len()).await;
        assert_eq!(exit, Exit::Success(2));
        assert!(log.events().is_empty());

        scope.release_all(Exit::Success(())).await;
        assert_eq!(log.events(), vec!["release db after success"]);
    }

    #[tokio::test]
    async fn failed_acquire_leaves_nothing_to_release() {
        let log = EventLog::new();
        let scope = ReleaseScope::new();
        let reservation = Reservation::new(
            fail::<&'static str, _, ()>("refused".to_string()),
            logged_release(&log),
        );

        let exit = reservation.reserve(&(), &scope, |_| ()).await;
        assert_eq!(exit, Exit::fail("refused".to_string()));
        scope.release_all(Exit::Success(())).await;
        assert!(log.events().is_empty());
    }

    #[tokio::test]
    async fn panicking_acquire_is_a_defect_without_release() {
        let log = EventLog::new();
        let scope = ReleaseScope::new();
        let acquire = from_fn::<&'static str, String, (), _>(|_| panic!("driver crashed"));
        let reservation = Reservation::new(acquire, logged_release(&log));

        let exit = reservation.reserve(&(), &scope, |_| ()).await;
        assert!(exit.cause().is_some_and(|cause| cause.is_die()));
        scope.release_all(Exit::Success(())).await;
        assert!(log.events().is_empty());
    }

    #[tokio::test]
    async fn panicking_continuation_still_binds_the_finalizer() {
        let log = EventLog::new();
        let scope = ReleaseScope::new();
        let reservation = Reservation::new(pure::<_, String, ()>("cache"), logged_release(&log));

        let exit: Exit<(), String> = reservation
            .reserve(&(), &scope, |_| panic!("bad continuation"))
            .await;
        assert_eq!(exit.cause().map(|cause| cause.defects().len()), Some(1));

        scope.release_all(Exit::Success(())).await;
        assert_eq!(log.events(), vec!["release cache after success"]);
    }
}
