//! Fibers: lightweight tasks that can be interrupted cooperatively.
//!
//! - [`FiberId`] identifies a fiber and tags the interrupts it issues
//! - [`FiberContext`] holds a fiber's region stack and pending interrupt
//! - [`Fiber`] is the handle returned by [`fork`] and [`Builder::fork`]

mod context;
mod handle;
mod id;

pub use context::FiberContext;
pub use handle::{fork, Builder, Fiber};
pub(crate) use handle::run_root;
pub use id::FiberId;
