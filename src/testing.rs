//! Testing utilities for code that manages resources.
//!
//! This module provides assertion macros for [`Exit`](crate::Exit) values and
//! two small helpers that make ordering tests easy to write:
//!
//! - [`EventLog`] records what acquire, body and release code did, in order
//! - [`Latch`] lets a test wait until a fiber reaches a given point
//!
//! # Examples
//!
//! ## Assertion Macros
//!
//! ```rust
//! use reservoir::{assert_failure, assert_interrupted, assert_success, Exit, FiberId};
//!
//! let ok: Exit<i32, String> = Exit::succeed(42);
//! assert_success!(ok);
//!
//! let failed: Exit<i32, String> = Exit::fail("nope".to_string());
//! assert_failure!(failed);
//!
//! let interrupted: Exit<i32, String> = Exit::interrupt(FiberId::NONE);
//! assert_interrupted!(interrupted);
//! ```
//!
//! ## Event Log
//!
//! ```rust
//! use reservoir::testing::EventLog;
//!
//! let log = EventLog::new();
//! let release_log = log.clone();
//! log.push("acquire");
//! release_log.push("release");
//! assert_eq!(log.events(), vec!["acquire", "release"]);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::sync::Deferred;

/// Assert that an exit is a success and evaluate to its value.
///
/// # Example
///
/// ```rust
/// use reservoir::{assert_success, Exit};
///
/// let exit: Exit<_, String> = Exit::succeed(42);
/// assert_eq!(assert_success!(exit), 42);
/// ```
#[macro_export]
macro_rules! assert_success {
    ($exit:expr) => {
        match $exit {
            $crate::Exit::Success(value) => value,
            $crate::Exit::Failure(cause) => {
                panic!("Expected Success, got Failure: {:?}", cause);
            }
        }
    };
}

/// Assert that an exit is a failure and evaluate to its cause.
///
/// Any cause matches: typed failure, interruption or defect.
///
/// # Example
///
/// ```rust
/// use reservoir::{assert_failure, Exit};
///
/// let exit: Exit<i32, _> = Exit::fail("disk full");
/// let cause = assert_failure!(exit);
/// assert_eq!(cause.failures(), vec![&"disk full"]);
/// ```
#[macro_export]
macro_rules! assert_failure {
    ($exit:expr) => {
        match $exit {
            $crate::Exit::Failure(cause) => cause,
            $crate::Exit::Success(value) => {
                panic!("Expected Failure, got Success: {:?}", value);
            }
        }
    };
}

/// Assert that an exit was caused by interruption.
///
/// # Example
///
/// ```rust
/// use reservoir::{assert_interrupted, Exit, FiberId};
///
/// let exit: Exit<i32, String> = Exit::interrupt(FiberId::NONE);
/// assert_interrupted!(exit);
/// ```
#[macro_export]
macro_rules! assert_interrupted {
    ($exit:expr) => {
        match $exit {
            $crate::Exit::Failure(cause) if cause.is_interrupted() => cause,
            $crate::Exit::Failure(cause) => {
                panic!("Expected interruption, got Failure: {:?}", cause);
            }
            $crate::Exit::Success(value) => {
                panic!("Expected interruption, got Success: {:?}", value);
            }
        }
    };
}

#[derive(Debug, Default)]
struct LogState {
    events: Mutex<Vec<String>>,
    notify: Notify,
}

/// A shared, ordered record of events.
///
/// Clones share the same log, so one clone can be moved into an acquire step
/// and another into its release.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    state: Arc<LogState>,
}

impl EventLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&self, event: impl Into<String>) {
        self.state.events.lock().push(event.into());
        self.state.notify.notify_waiters();
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<String> {
        self.state.events.lock().clone()
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.state.events.lock().len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until at least `len` events have been recorded.
    pub async fn wait_for_len(&self, len: usize) {
        loop {
            let notified = self.state.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.len() >= len {
                return;
            }
            notified.await;
        }
    }
}

/// A one-shot gate: closed until opened, then open forever.
#[derive(Debug, Clone, Default)]
pub struct Latch {
    cell: Arc<Deferred<()>>,
}

impl Latch {
    /// A closed latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the latch, releasing every waiter. Opening twice is harmless.
    pub fn open(&self) {
        let _ = self.cell.complete(());
    }

    /// Returns `true` once the latch has been opened.
    pub fn is_open(&self) -> bool {
        self.cell.is_completed()
    }

    /// Wait until the latch is opened.
    pub async fn wait(&self) {
        self.cell.wait().await;
    }
}
