//! Terminal outcomes of effects and fibers.
//!
//! An [`Exit`] is either a success value or a [`Cause`] describing why the
//! computation did not succeed. Causes keep the three kinds of trouble apart:
//!
//! - [`Cause::Fail`] - an expected, typed error
//! - [`Cause::Interrupt`] - cooperative cancellation, tagged with the canceller
//! - [`Cause::Die`] - an unexpected [`Defect`], usually a caught panic
//!
//! [`Cause::Then`] aggregates two causes that happened one after another, which
//! is how a finalizer defect is reported alongside the failure that triggered
//! the release.
//!
//! # Example
//!
//! ```rust
//! use reservoir::exit::{Cause, Defect, Exit};
//! use reservoir::fiber::FiberId;
//!
//! let exit: Exit<i32, String> = Exit::interrupt(FiberId::NONE);
//! assert!(exit.is_interrupted());
//!
//! let cause = Cause::<String>::interrupt(FiberId::NONE).then(Cause::die(Defect::new("close failed")));
//! assert!(cause.is_interrupted());
//! assert_eq!(cause.defects().len(), 1);
//! ```

use std::any::Any;
use std::fmt;

use crate::fiber::FiberId;

// ============================================================================
// Defect
// ============================================================================

/// An unexpected fault raised by acquire, body or release code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Defect {
    message: String,
}

impl Defect {
    /// Create a defect with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Defect {
            message: message.into(),
        }
    }

    /// Build a defect from a panic payload.
    ///
    /// String payloads (the common `panic!("...")` case) keep their message;
    /// anything else is reported as an opaque panic.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_string(),
                Err(_) => "panic with a non-string payload".to_string(),
            },
        };
        Defect { message }
    }

    /// The defect message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Defect {}

// ============================================================================
// Cause
// ============================================================================

/// Why a computation did not succeed.
///
/// This enum design keeps every cause explicit: nothing is collapsed or
/// preferred when several things go wrong in sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cause<E> {
    /// Expected, typed failure.
    Fail(E),
    /// Interrupted by the given fiber.
    Interrupt(FiberId),
    /// Unexpected defect.
    Die(Defect),
    /// The first cause happened, then the second one (during finalization).
    Then(Box<Cause<E>>, Box<Cause<E>>),
}

impl<E> Cause<E> {
    /// A typed failure.
    pub fn fail(error: E) -> Self {
        Cause::Fail(error)
    }

    /// An interruption issued by `by`.
    pub fn interrupt(by: FiberId) -> Self {
        Cause::Interrupt(by)
    }

    /// A defect.
    pub fn die(defect: Defect) -> Self {
        Cause::Die(defect)
    }

    /// Sequence this cause with one that happened afterwards.
    pub fn then(self, next: Cause<E>) -> Self {
        Cause::Then(Box::new(self), Box::new(next))
    }

    /// All typed failures, in order of occurrence.
    pub fn failures(&self) -> Vec<&E> {
        let mut out = Vec::new();
        self.visit(&mut |cause| {
            if let Cause::Fail(e) = cause {
                out.push(e);
            }
        });
        out
    }

    /// All defects, in order of occurrence.
    pub fn defects(&self) -> Vec<&Defect> {
        let mut out = Vec::new();
        self.visit(&mut |cause| {
            if let Cause::Die(d) = cause {
                out.push(d);
            }
        });
        out
    }

    /// Ids of every fiber that interrupted this computation.
    pub fn interruptors(&self) -> Vec<FiberId> {
        let mut out = Vec::new();
        self.visit(&mut |cause| {
            if let Cause::Interrupt(id) = cause {
                out.push(*id);
            }
        });
        out
    }

    /// Returns `true` if the cause contains an interruption.
    pub fn is_interrupted(&self) -> bool {
        !self.interruptors().is_empty()
    }

    /// Returns `true` if interruption is the only thing that happened.
    pub fn is_interrupted_only(&self) -> bool {
        self.is_interrupted() && self.failures().is_empty() && self.defects().is_empty()
    }

    /// Returns `true` if the cause contains a typed failure.
    pub fn is_failure(&self) -> bool {
        !self.failures().is_empty()
    }

    /// Returns `true` if the cause contains a defect.
    pub fn is_die(&self) -> bool {
        !self.defects().is_empty()
    }

    /// Transform every typed failure.
    pub fn map<E2, F>(self, mut f: F) -> Cause<E2>
    where
        F: FnMut(E) -> E2,
    {
        self.map_with(&mut f)
    }

    fn map_with<E2, F>(self, f: &mut F) -> Cause<E2>
    where
        F: FnMut(E) -> E2,
    {
        match self {
            Cause::Fail(e) => Cause::Fail(f(e)),
            Cause::Interrupt(id) => Cause::Interrupt(id),
            Cause::Die(d) => Cause::Die(d),
            Cause::Then(first, next) => {
                let first = (*first).map_with(f);
                Cause::Then(Box::new(first), Box::new((*next).map_with(f)))
            }
        }
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Cause<E>)) {
        match self {
            Cause::Then(first, next) => {
                first.visit(f);
                next.visit(f);
            }
            leaf => f(leaf),
        }
    }
}

impl<E: fmt::Display> fmt::Display for Cause<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::Fail(e) => write!(f, "{}", e),
            Cause::Interrupt(id) => write!(f, "interrupted by {}", id),
            Cause::Die(d) => write!(f, "defect: {}", d),
            Cause::Then(first, next) => write!(f, "{}; then {}", first, next),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for Cause<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Cause::Fail(e) => Some(e),
            Cause::Die(d) => Some(d),
            Cause::Interrupt(_) => None,
            Cause::Then(first, next) => first.source().or_else(|| next.source()),
        }
    }
}

// ============================================================================
// Exit
// ============================================================================

/// Terminal outcome of an effect or fiber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit<T, E> {
    /// Completed with a value.
    Success(T),
    /// Did not complete; the cause says why.
    Failure(Cause<E>),
}

impl<T, E> Exit<T, E> {
    /// A successful exit.
    pub fn succeed(value: T) -> Self {
        Exit::Success(value)
    }

    /// A typed failure.
    pub fn fail(error: E) -> Self {
        Exit::Failure(Cause::Fail(error))
    }

    /// An interruption issued by `by`.
    pub fn interrupt(by: FiberId) -> Self {
        Exit::Failure(Cause::Interrupt(by))
    }

    /// A defect.
    pub fn die(defect: Defect) -> Self {
        Exit::Failure(Cause::Die(defect))
    }

    /// Returns `true` for [`Exit::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Exit::Success(_))
    }

    /// Returns `true` for [`Exit::Failure`], whatever the cause.
    pub fn is_failure(&self) -> bool {
        matches!(self, Exit::Failure(_))
    }

    /// Returns `true` if the exit was caused (at least partly) by interruption.
    pub fn is_interrupted(&self) -> bool {
        match self {
            Exit::Success(_) => false,
            Exit::Failure(cause) => cause.is_interrupted(),
        }
    }

    /// The success value, if any.
    pub fn success(&self) -> Option<&T> {
        match self {
            Exit::Success(value) => Some(value),
            Exit::Failure(_) => None,
        }
    }

    /// The failure cause, if any.
    pub fn cause(&self) -> Option<&Cause<E>> {
        match self {
            Exit::Success(_) => None,
            Exit::Failure(cause) => Some(cause),
        }
    }

    /// Transform the success value.
    pub fn map<U, F>(self, f: F) -> Exit<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Exit::Success(value) => Exit::Success(f(value)),
            Exit::Failure(cause) => Exit::Failure(cause),
        }
    }

    /// Transform every typed failure in the cause.
    pub fn map_err<E2, F>(self, f: F) -> Exit<T, E2>
    where
        F: FnMut(E) -> E2,
    {
        match self {
            Exit::Success(value) => Exit::Success(value),
            Exit::Failure(cause) => Exit::Failure(cause.map(f)),
        }
    }

    /// Convert into a `Result`, keeping the full cause on the error side.
    pub fn into_result(self) -> Result<T, Cause<E>> {
        match self {
            Exit::Success(value) => Ok(value),
            Exit::Failure(cause) => Err(cause),
        }
    }

    /// Separate the success value from the shape of the exit.
    ///
    /// Finalizers observe the returned `Exit<(), E>` by reference; the value is
    /// put back with [`Exit::rejoin`] afterwards.
    pub(crate) fn split(self) -> (Option<T>, Exit<(), E>) {
        match self {
            Exit::Success(value) => (Some(value), Exit::Success(())),
            Exit::Failure(cause) => (None, Exit::Failure(cause)),
        }
    }

    /// Inverse of [`Exit::split`].
    pub(crate) fn rejoin(value: Option<T>, shape: Exit<(), E>) -> Self {
        match (value, shape) {
            (Some(value), Exit::Success(())) => Exit::Success(value),
            (_, Exit::Failure(cause)) => Exit::Failure(cause),
            (None, Exit::Success(())) => {
                Exit::die(Defect::new("success exit lost its value during release"))
            }
        }
    }

    /// Attach defects raised by finalizers.
    ///
    /// With no defects the exit is returned unchanged. Otherwise a failed exit
    /// becomes `Then(original, defects)`; a successful one becomes a failure
    /// carrying only the defects.
    pub(crate) fn with_release_defects(self, defects: Vec<Defect>) -> Self {
        let Some(release_cause) = defects
            .into_iter()
            .map(Cause::Die)
            .reduce(|first, next| first.then(next))
        else {
            return self;
        };

        match self {
            Exit::Success(_) => {
                tracing::warn!(
                    "finalizer raised a defect after a successful use; discarding the success value"
                );
                Exit::Failure(release_cause)
            }
            Exit::Failure(cause) => Exit::Failure(cause.then(release_cause)),
        }
    }
}

impl<T, E> From<Result<T, E>> for Exit<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Exit::Success(value),
            Err(error) => Exit::fail(error),
        }
    }
}

impl<T: fmt::Display, E: fmt::Display> fmt::Display for Exit<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exit::Success(value) => write!(f, "success: {}", value),
            Exit::Failure(cause) => write!(f, "failure: {}", cause),
        }
    }
}
