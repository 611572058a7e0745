//! Effect trait definition - the core abstraction the runtime executes.
//!
//! An `Effect` is a description of a computation that:
//! - Produces a value of type `Output` on success
//! - May fail with a typed error of type `Error`
//! - Depends on an environment of type `Env`
//! - May be interrupted or die with a defect
//!
//! Running an effect yields an [`Exit`], never a bare `Result`: interruption
//! and defects are first-class outcomes that resource code must observe.
//!
//! # Environment Cloning
//!
//! The `Env` type requires `Clone` so that effects can be boxed or forked onto
//! a new fiber. Keep environments cheap to clone by wrapping shared resources
//! in `Arc`:
//!
//! ```rust,ignore
//! #[derive(Clone)]
//! struct AppEnv {
//!     pool: Arc<ConnectionPool>,
//!     config: Arc<Config>,
//! }
//! ```

use std::future::Future;

use crate::exit::Exit;

/// The core Effect trait.
///
/// Combinators return concrete types (zero-cost, like `Future` and
/// `Iterator`); use `.boxed()` when type erasure is needed.
///
/// # Example
///
/// ```rust,ignore
/// use reservoir::effect::prelude::*;
///
/// fn open_queue(capacity: usize) -> impl Effect<Output = Queue, Error = QueueError, Env = AppEnv> {
///     from_fn(move |env: &AppEnv| env.broker.open(capacity))
/// }
/// ```
pub trait Effect: Sized + Send {
    /// The success type produced by this effect.
    type Output: Send;

    /// The typed error that may be produced.
    type Error: Send;

    /// The environment type required to run this effect.
    type Env: Clone + Send + Sync;

    /// Execute this effect with the given environment.
    ///
    /// Interruption is only observed inside interruptible regions of the
    /// calling fiber; outside any fiber the effect simply runs to completion.
    fn run(self, env: &Self::Env) -> impl Future<Output = Exit<Self::Output, Self::Error>> + Send;
}
