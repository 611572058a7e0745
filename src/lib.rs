//! # Reservoir
//!
//! Interrupt-safe managed resources for cooperative fibers.
//!
//! A fiber may be interrupted at any suspension point, which makes the usual
//! "open, use, close" sequence fragile: an interrupt that lands between the
//! open and the close leaks the resource. Reservoir describes resources as
//! [`Managed`](managed::Managed) recipes and guarantees that everything a
//! recipe acquired is released exactly once, in reverse order, with the
//! [`Exit`] of the code that used it, even when that code was interrupted.
//!
//! ## Quick Example
//!
//! ```rust
//! use reservoir::prelude::*;
//! use reservoir::managed;
//! use reservoir::testing::EventLog;
//!
//! # tokio_test::block_on(async {
//! let log = EventLog::new();
//! let (open_log, close_log) = (log.clone(), log.clone());
//!
//! let file = managed::make(
//!     from_fn(move |_: &()| {
//!         open_log.push("open");
//!         Ok::<_, String>("report.csv")
//!     }),
//!     move |_path| async move { close_log.push("close") },
//! );
//!
//! let exit = file
//!     .with(|path| fail::<usize, _, ()>(format!("cannot write {}", path)))
//!     .execute(&())
//!     .await;
//!
//! assert_eq!(exit, Exit::fail("cannot write report.csv".to_string()));
//! assert_eq!(log.events(), vec!["open", "close"]);
//! # });
//! ```
//!
//! ## Modules
//!
//! - [`interrupt`]: the two-valued [`InterruptStatus`]
//! - [`exit`]: [`Exit`], [`Cause`] and [`Defect`]
//! - [`fiber`]: forking, interrupting and joining fibers
//! - [`effect`]: a minimal effect layer with region combinators
//! - [`managed`]: reservations, recipes and [`ManagedExt::with`](managed::ManagedExt::with)
//! - [`sync`]: the single-assignment [`Deferred`](sync::Deferred) cell
//! - [`testing`]: assertion macros and ordering helpers

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod effect;
pub mod exit;
pub mod fiber;
pub mod interrupt;
pub mod managed;
pub mod sync;
pub mod testing;

// Re-exports
pub use effect::{BoxedEffect, Effect, EffectExt};
pub use exit::{Cause, Defect, Exit};
pub use fiber::{Fiber, FiberId};
pub use interrupt::InterruptStatus;
pub use managed::{Managed, ManagedExt, Reservation};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::effect::prelude::*;
    pub use crate::fiber::{fork, Fiber, FiberId};
    pub use crate::managed::{Managed, ManagedExt, Reservation};
}
