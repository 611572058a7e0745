//! Single-assignment cell.
//!
//! A [`Deferred`] starts empty and is completed at most once. Any number of
//! readers can wait for the value; waiting suspends the task instead of
//! blocking the worker thread.

use std::sync::OnceLock;

use tokio::sync::Notify;

/// A value that is set exactly once and read by many.
///
/// # Example
///
/// ```rust
/// use reservoir::sync::Deferred;
///
/// # tokio_test::block_on(async {
/// let cell = Deferred::new();
/// assert!(cell.complete(1).is_ok());
/// assert_eq!(cell.complete(2), Err(2));
/// assert_eq!(*cell.wait().await, 1);
/// # });
/// ```
#[derive(Debug)]
pub struct Deferred<T> {
    value: OnceLock<T>,
    notify: Notify,
}

impl<T> Deferred<T> {
    /// An empty cell.
    pub fn new() -> Self {
        Deferred {
            value: OnceLock::new(),
            notify: Notify::new(),
        }
    }

    /// Set the value and wake every waiter.
    ///
    /// Returns the value back if the cell was already completed.
    pub fn complete(&self, value: T) -> Result<(), T> {
        self.value.set(value)?;
        self.notify.notify_waiters();
        Ok(())
    }

    /// Returns `true` once the cell holds a value.
    pub fn is_completed(&self) -> bool {
        self.value.get().is_some()
    }

    /// The value, if the cell has been completed.
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Wait until the cell is completed.
    pub async fn wait(&self) -> &T {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(value) = self.value.get() {
                return value;
            }
            notified.await;
        }
    }
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}
