//! Prelude module for convenient imports.
//!
//! Re-exports the effect traits, constructors and region combinators, plus
//! the [`Exit`] type every effect produces.
//!
//! # Example
//!
//! ```rust,ignore
//! use reservoir::effect::prelude::*;
//!
//! let effect = pure::<_, String, ()>(42)
//!     .map(|x| x * 2)
//!     .and_then(|x| pure(x + 1));
//!
//! assert_eq!(effect.execute(&()).await, Exit::Success(85));
//! ```

// Traits
pub use crate::effect::ext::EffectExt;
pub use crate::effect::trait_def::Effect;
pub use crate::effect::tracing::EffectTracingExt;

// Boxed Effect
pub use crate::effect::boxed::{BoxFuture, BoxedEffect};

// Combinator Types (for advanced use, usually `impl Effect` suffices)
pub use crate::effect::combinators::{
    AndThen, CheckInterruptible, Die, Fail, FromAsync, FromFn, FromResult, Map, MapErr, Never,
    Pure,
};
pub use crate::effect::region::{Region, Restore, UninterruptibleMask};

// Constructors
pub use crate::effect::constructors::{
    check_interruptible, die, fail, from_async, from_fn, from_result, interruptible, never, pure,
    uninterruptible, uninterruptible_mask,
};

// Outcomes
pub use crate::exit::{Cause, Defect, Exit};
pub use crate::interrupt::InterruptStatus;
