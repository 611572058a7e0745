//! Managed resources: acquire, use, always release.
//!
//! A [`Managed`] value is a recipe. It owns no resource until it is run by
//! [`ManagedExt::with`], which acquires everything the recipe describes,
//! lends the result to a body effect and releases every acquired resource
//! afterwards, whatever happened to the body. Release is exactly-once,
//! ordered (most recently acquired first) and cannot be interrupted.
//!
//! # Example
//!
//! ```rust,ignore
//! use reservoir::prelude::*;
//! use reservoir::managed;
//!
//! let files = managed::make(open_queue("jobs"), |queue| queue.shutdown())
//!     .flat_map(|queue| managed::make(open_file(queue.spool_path()), |file| file.close()));
//!
//! let exit = files
//!     .with(|file| write_report(file.handle()))
//!     .execute(&env)
//!     .await;
//! ```
//!
//! # Borrowing
//!
//! The body receives `&A` and returns an effect that cannot borrow it. Values
//! the body needs across suspension points are cloned out first, typically an
//! `Arc` handle held by the resource.

mod combinators;
mod constructors;
mod reservation;
mod scope;
mod with;

use std::future::Future;

pub use combinators::{FlatMap, Map, ZipWith};
pub use constructors::{
    fail, from_effect, make, make_exit, make_reservation, succeed, Fail, FromEffect,
    MakeReservation, Succeed,
};
pub use reservation::Reservation;
pub use scope::ReleaseScope;
pub use with::With;

use crate::effect::trait_def::Effect;
use crate::exit::Exit;

/// A recipe for acquiring a value whose release is guaranteed.
///
/// Running a recipe reserves its resources into a [`ReleaseScope`] and passes
/// a borrow of the produced value to a continuation. The continuation runs
/// synchronously, right after the value is produced and before its finalizer
/// is bound, so no interrupt can land in between.
///
/// Implementations are provided by the constructors in this module; most
/// code only composes them through [`ManagedExt`].
pub trait Managed: Sized + Send {
    /// The value lent to the body.
    type Output: Send;

    /// The typed error of acquisition.
    type Error: Send + 'static;

    /// The environment needed to acquire.
    type Env: Clone + Send + Sync;

    /// Acquire into `scope` and continue with `k`.
    ///
    /// A panic raised by `k` is reported as a defect; any finalizer already
    /// bound stays in the scope.
    fn reserve<K, F>(
        self,
        env: &Self::Env,
        scope: &ReleaseScope<Self::Error>,
        k: F,
    ) -> impl Future<Output = Exit<K, Self::Error>> + Send
    where
        F: FnOnce(&Self::Output) -> K + Send,
        K: Send;
}

/// Combinators available on every [`Managed`] recipe.
pub trait ManagedExt: Managed {
    /// Acquire, run `body` with the value, then release.
    ///
    /// The acquisition and the release run uninterruptibly; the body runs
    /// with the status the caller had. The returned effect finishes with the
    /// body's exit, or with the acquisition failure when nothing could be
    /// used. Defects raised by finalizers are appended to that exit.
    fn with<F, U>(self, body: F) -> With<Self, F>
    where
        F: FnOnce(&Self::Output) -> U + Send,
        U: Effect<Error = Self::Error, Env = Self::Env>,
    {
        With {
            managed: self,
            body,
        }
    }

    /// Acquire the recipe built from this value after this one.
    ///
    /// Release happens in reverse order. When the second acquisition fails,
    /// the first resource is still released before the failure is reported.
    fn flat_map<F, M>(self, f: F) -> FlatMap<Self, F>
    where
        F: FnOnce(&Self::Output) -> M + Send,
        M: Managed<Error = Self::Error, Env = Self::Env>,
    {
        FlatMap { inner: self, f }
    }

    /// Alias for [`ManagedExt::flat_map`].
    fn and_then<F, M>(self, f: F) -> FlatMap<Self, F>
    where
        F: FnOnce(&Self::Output) -> M + Send,
        M: Managed<Error = Self::Error, Env = Self::Env>,
    {
        self.flat_map(f)
    }

    /// Derive a new value from the acquired one. Release is unaffected.
    fn map<B, F>(self, f: F) -> Map<Self, F>
    where
        F: FnOnce(&Self::Output) -> B + Send,
        B: Send,
    {
        Map { inner: self, f }
    }

    /// Acquire both recipes, left first, and combine their values.
    fn zip_with<M, F, C>(self, other: M, f: F) -> ZipWith<Self, M, F>
    where
        Self::Output: Clone,
        M: Managed<Error = Self::Error, Env = Self::Env>,
        F: FnOnce(&Self::Output, &M::Output) -> C + Send,
        C: Send,
    {
        ZipWith {
            left: self,
            right: other,
            f,
        }
    }
}

impl<M: Managed> ManagedExt for M {}
