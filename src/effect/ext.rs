//! Extension trait providing combinator methods for all Effects.
//!
//! The `EffectExt` trait is automatically implemented for all types
//! that implement `Effect`. It provides ergonomic combinator methods
//! like `map`, `and_then`, `boxed` and the region methods, plus
//! [`EffectExt::execute`] to run an effect as a root fiber.

use std::future::Future;

use crate::effect::boxed::BoxedEffect;
use crate::effect::combinators::{AndThen, Map, MapErr};
use crate::effect::region::Region;
use crate::effect::trait_def::Effect;
use crate::exit::Exit;
use crate::interrupt::InterruptStatus;

/// Extension trait providing combinator methods for all Effects.
///
/// This trait is automatically implemented for all types that implement `Effect`.
/// You don't need to implement this trait yourself.
///
/// # Example
///
/// ```rust,ignore
/// use reservoir::effect::prelude::*;
///
/// let effect = pure::<_, String, ()>(21)
///     .map(|x| x * 2)
///     .and_then(|x| pure(x + 1))
///     .map_err(|e| format!("Error: {}", e));
///
/// assert_eq!(effect.execute(&()).await, Exit::Success(43));
/// ```
pub trait EffectExt: Effect {
    /// Transform the success value.
    fn map<U, F>(self, f: F) -> Map<Self, F>
    where
        F: FnOnce(Self::Output) -> U + Send,
        U: Send,
    {
        Map { inner: self, f }
    }

    /// Transform every typed failure.
    ///
    /// Useful for converting error types to enable chaining with `and_then`.
    /// Interruptions and defects are left untouched.
    fn map_err<E2, F>(self, f: F) -> MapErr<Self, F>
    where
        F: FnMut(Self::Error) -> E2 + Send,
        E2: Send,
    {
        MapErr { inner: self, f }
    }

    /// Chain a dependent effect.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let effect = pure::<_, String, ()>(21).and_then(|x| pure(x * 2));
    /// assert_eq!(effect.execute(&()).await, Exit::Success(42));
    /// ```
    fn and_then<E2, F>(self, f: F) -> AndThen<Self, F>
    where
        E2: Effect<Error = Self::Error, Env = Self::Env>,
        F: FnOnce(Self::Output) -> E2 + Send,
    {
        AndThen { inner: self, f }
    }

    /// Erase the concrete type of this effect.
    fn boxed(self) -> BoxedEffect<Self::Output, Self::Error, Self::Env>
    where
        Self: 'static,
        Self::Output: 'static,
        Self::Error: 'static,
        Self::Env: 'static,
    {
        BoxedEffect::new(self)
    }

    /// Run this effect in an interruptible region.
    fn interruptible(self) -> Region<Self> {
        self.with_interrupt_status(InterruptStatus::Interruptible)
    }

    /// Run this effect in an uninterruptible region.
    fn uninterruptible(self) -> Region<Self> {
        self.with_interrupt_status(InterruptStatus::Uninterruptible)
    }

    /// Run this effect in a region with the given status.
    fn with_interrupt_status(self, status: InterruptStatus) -> Region<Self> {
        Region {
            inner: self,
            status,
        }
    }

    /// Run this effect to completion.
    ///
    /// Called from plain async code the effect runs as a fresh root fiber in
    /// the current task; called from inside a fiber it runs as part of that
    /// fiber. Panics are reported as defects.
    fn execute(self, env: &Self::Env) -> impl Future<Output = Exit<Self::Output, Self::Error>> + Send {
        crate::fiber::run_root(self, env)
    }
}

impl<E: Effect> EffectExt for E {}
