//! Minimal effect layer.
//!
//! An [`Effect`] describes an async computation that depends on an
//! environment and finishes with an [`Exit`](crate::exit::Exit): a value, a
//! typed failure, an interruption or a defect. Combinators return concrete
//! types (zero-cost by default); `.boxed()` opts into type erasure when a
//! collection, recursion or differing match arms require it.
//!
//! Region combinators ([`interruptible`](constructors::interruptible),
//! [`uninterruptible`](constructors::uninterruptible) and
//! [`uninterruptible_mask`](constructors::uninterruptible_mask)) control
//! where interrupts may be delivered.
//!
//! # Example
//!
//! ```rust,ignore
//! use reservoir::effect::prelude::*;
//!
//! let effect = pure::<_, String, ()>(42)
//!     .map(|x| x + 1)
//!     .and_then(|x| pure(x * 2))
//!     .uninterruptible();
//!
//! assert_eq!(effect.execute(&()).await, Exit::Success(86));
//! ```
//!
//! # Environment Cloning
//!
//! The environment (`Env`) must implement `Clone`. Boxing and forking clone
//! it into a `'static` future, so keep it cheap by wrapping shared resources
//! in `Arc`.

pub mod boxed;
pub mod combinators;
pub mod constructors;
pub mod ext;
pub mod prelude;
pub mod region;
pub mod tracing;
pub mod trait_def;


pub use boxed::{BoxFuture, BoxedEffect};
pub use ext::EffectExt;
pub use trait_def::Effect;
