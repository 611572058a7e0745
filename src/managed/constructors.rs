//! Constructors for [`Managed`] recipes.

use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;

use crate::effect::region::{catch_defect, run_region};
use crate::effect::trait_def::Effect;
use crate::exit::{Defect, Exit};
use crate::interrupt::InterruptStatus;
use crate::managed::reservation::Reservation;
use crate::managed::scope::ReleaseScope;
use crate::managed::Managed;

/// Call `k` with `value`, reporting a panic as a defect.
fn continue_with<A, K, E, F>(value: &A, k: F) -> Exit<K, E>
where
    F: FnOnce(&A) -> K,
{
    match std::panic::catch_unwind(AssertUnwindSafe(|| k(value))) {
        Ok(result) => Exit::Success(result),
        Err(payload) => Exit::die(Defect::from_panic(payload)),
    }
}

/// A resource with an uninterruptible acquire and a release that ignores
/// how it was used.
///
/// # Example
///
/// ```rust,ignore
/// use reservoir::managed;
///
/// let file = managed::make(open("report.csv"), |file| async move { file.close().await });
/// ```
pub fn make<Acq, Rel, Fut>(
    acquire: Acq,
    release: Rel,
) -> impl Managed<Output = Acq::Output, Error = Acq::Error, Env = Acq::Env>
where
    Acq: Effect,
    Acq::Output: 'static,
    Acq::Error: 'static,
    Rel: FnOnce(Acq::Output) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    make_exit(acquire, move |resource, _exit: &Exit<(), Acq::Error>| {
        release(resource)
    })
}

/// A resource with an uninterruptible acquire and a release that sees the
/// exit of the code that used it.
pub fn make_exit<Acq, Rel, Fut>(acquire: Acq, release: Rel) -> Reservation<Acq, Rel>
where
    Acq: Effect,
    Acq::Output: 'static,
    Acq::Error: 'static,
    Rel: FnOnce(Acq::Output, &Exit<(), Acq::Error>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Reservation::new(acquire, release).uninterruptible()
}

/// A resource described by an effect that yields a [`Reservation`].
///
/// The effect itself runs uninterruptibly. The reservation's acquire then
/// runs with the status the caller had on entering `with` (or the one set by
/// [`Reservation::with_status`]), so an interruptible caller can cancel a
/// long acquisition (waiting for a pool slot, say) before it produces
/// anything, while a masked caller stays masked.
pub fn make_reservation<Eff>(effect: Eff) -> MakeReservation<Eff>
where
    Eff: Effect,
    Eff::Output: Managed<Error = Eff::Error, Env = Eff::Env>,
{
    MakeReservation { effect }
}

/// A value produced by an effect, with nothing to release.
pub fn from_effect<Eff: Effect>(effect: Eff) -> FromEffect<Eff> {
    FromEffect { effect }
}

/// A plain value with nothing to release.
pub fn succeed<A, E, Env>(value: A) -> Succeed<A, E, Env> {
    Succeed {
        value,
        _phantom: PhantomData,
    }
}

/// An acquisition that fails with `error`.
pub fn fail<A, E, Env>(error: E) -> Fail<A, E, Env> {
    Fail {
        error,
        _phantom: PhantomData,
    }
}

/// Recipe created by [`make_reservation`].
pub struct MakeReservation<Eff> {
    effect: Eff,
}

impl<Eff> std::fmt::Debug for MakeReservation<Eff> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MakeReservation")
            .field("effect", &"<effect>")
            .finish()
    }
}

impl<Eff> Managed for MakeReservation<Eff>
where
    Eff: Effect,
    Eff::Error: 'static,
    Eff::Output: Managed<Error = Eff::Error, Env = Eff::Env>,
{
    type Output = <Eff::Output as Managed>::Output;
    type Error = Eff::Error;
    type Env = Eff::Env;

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
        let reservation = run_region(
            InterruptStatus::Uninterruptible,
            catch_defect(self.effect.run(env)),
        )
        .await;
        match reservation {
            Exit::Success(reservation) => reservation.reserve(env, scope, k).await,
            Exit::Failure(cause) => Exit::Failure(cause),
        }
    }
}

/// Recipe created by [`from_effect`].
pub struct FromEffect<Eff> {
    effect: Eff,
}

impl<Eff> std::fmt::Debug for FromEffect<Eff> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FromEffect")
            .field("effect", &"<effect>")
            .finish()
    }
}

impl<Eff> Managed for FromEffect<Eff>
where
    Eff: Effect,
    Eff::Error: 'static,
{
    type Output = Eff::Output;
    type Error = Eff::Error;
    type Env = Eff::Env;

    async fn reserve<K, F>(
        self,
        env: &Self::Env,
        _scope: &ReleaseScope<Self::Error>,
        k: F,
    ) -> Exit<K, Self::Error>
    where
        F: FnOnce(&Self::Output) -> K + Send,
        K: Send,
    {
        match catch_defect(self.effect.run(env)).await {
            Exit::Success(value) => continue_with(&value, k),
            Exit::Failure(cause) => Exit::Failure(cause),
        }
    }
}

/// Recipe created by [`succeed`].
#[derive(Debug, Clone)]
pub struct Succeed<A, E, Env> {
    value: A,
    _phantom: PhantomData<fn() -> (E, Env)>,
}

impl<A, E, Env> Managed for Succeed<A, E, Env>
where
    A: Send,
    E: Send + 'static,
    Env: Clone + Send + Sync,
{
    type Output = A;
    type Error = E;
    type Env = Env;

    async fn reserve<K, F>(
        self,
        _env: &Self::Env,
        _scope: &ReleaseScope<Self::Error>,
        k: F,
    ) -> Exit<K, Self::Error>
    where
        F: FnOnce(&Self::Output) -> K + Send,
        K: Send,
    {
        continue_with(&self.value, k)
    }
}

/// Recipe created by [`fail`].
#[derive(Debug, Clone)]
pub struct Fail<A, E, Env> {
    error: E,
    _phantom: PhantomData<fn() -> (A, Env)>,
}

impl<A, E, Env> Managed for Fail<A, E, Env>
where
    A: Send,
    E: Send + 'static,
    Env: Clone + Send + Sync,
{
    type Output = A;
    type Error = E;
    type Env = Env;

    async fn reserve<K, F>(
        self,
        _env: &Self::Env,
        _scope: &ReleaseScope<Self::Error>,
        _k: F,
    ) -> Exit<K, Self::Error>
    where
        F: FnOnce(&Self::Output) -> K + Send,
        K: Send,
    {
        Exit::fail(self.error)
    }
}
