//! Synchronization primitives used by the resource machinery.

mod deferred;

pub use deferred::Deferred;
