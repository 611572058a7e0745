//! Interruptibility of a fiber's current execution region.
//!
//! Every fiber carries a stack of [`InterruptStatus`] values (see
//! [`crate::fiber::FiberContext`]). The top of that stack decides whether an
//! interrupt request can be delivered right now or has to wait until the
//! fiber leaves its masked region.
//!
//! # Example
//!
//! ```rust
//! use reservoir::InterruptStatus;
//!
//! let status = InterruptStatus::uninterruptible();
//! assert!(status.is_uninterruptible());
//! assert_eq!(InterruptStatus::from_bool(status.to_bool()), status);
//! ```

use std::fmt;

/// Whether interrupts may be delivered in the current region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InterruptStatus {
    /// Interrupts are delivered at the next suspension point.
    #[default]
    Interruptible,
    /// Interrupts are recorded and delivered once the region ends.
    Uninterruptible,
}

impl InterruptStatus {
    /// The interruptible status.
    pub const fn interruptible() -> Self {
        InterruptStatus::Interruptible
    }

    /// The uninterruptible status.
    pub const fn uninterruptible() -> Self {
        InterruptStatus::Uninterruptible
    }

    /// Returns `true` for [`InterruptStatus::Interruptible`].
    pub const fn is_interruptible(self) -> bool {
        matches!(self, InterruptStatus::Interruptible)
    }

    /// Returns `true` for [`InterruptStatus::Uninterruptible`].
    pub const fn is_uninterruptible(self) -> bool {
        matches!(self, InterruptStatus::Uninterruptible)
    }

    /// Convert from the compact boolean form, `true` meaning interruptible.
    pub const fn from_bool(interruptible: bool) -> Self {
        if interruptible {
            InterruptStatus::Interruptible
        } else {
            InterruptStatus::Uninterruptible
        }
    }

    /// Convert to the compact boolean form, `true` meaning interruptible.
    pub const fn to_bool(self) -> bool {
        self.is_interruptible()
    }
}

impl From<bool> for InterruptStatus {
    fn from(interruptible: bool) -> Self {
        InterruptStatus::from_bool(interruptible)
    }
}

impl From<InterruptStatus> for bool {
    fn from(status: InterruptStatus) -> Self {
        status.to_bool()
    }
}

impl fmt::Display for InterruptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterruptStatus::Interruptible => write!(f, "interruptible"),
            InterruptStatus::Uninterruptible => write!(f, "uninterruptible"),
        }
    }
}

#[cfg(feature = "proptest")]
impl proptest::arbitrary::Arbitrary for InterruptStatus {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        use proptest::strategy::Strategy;
        proptest::bool::ANY.prop_map(InterruptStatus::from_bool).boxed()
    }
}
