//! Fiber identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a fiber.
///
/// [`FiberId::NONE`] stands in for "no fiber": interrupts issued from plain
/// async code outside any fiber carry it as their canceller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FiberId(u64);

impl FiberId {
    /// The id used when no fiber is involved.
    pub const NONE: FiberId = FiberId(0);

    pub(crate) fn next() -> Self {
        FiberId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric id.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns `true` for [`FiberId::NONE`].
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "#none")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_never_none() {
        let a = FiberId::next();
        let b = FiberId::next();
        assert_ne!(a, b);
        assert!(!a.is_none());
        assert!(FiberId::NONE.is_none());
    }

    #[test]
    fn display() {
        assert_eq!(FiberId::NONE.to_string(), "#none");
        assert_eq!(FiberId(7).to_string(), "#7");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_transparently() {
        assert_eq!(serde_json::to_string(&FiberId(3)).unwrap(), "3");
    }
}
