//! Release obligations collected while a managed value is acquired.
//!
//! Every leaf reservation registers an [`ObligationSlot`] in the
//! [`ReleaseScope`] before its acquire step starts. The slot is completed
//! exactly once: with the bound finalizer when acquisition produced a
//! resource, or with nothing when it did not. Releasing the scope walks the
//! obligations in reverse registration order.
//!
//! An obligation leaves the scope only once its finalizer has finished, so a
//! scope dropped in the middle of a release hands the finalizer that was
//! running to the background task together with the ones still waiting.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use parking_lot::Mutex;

use crate::effect::boxed::BoxFuture;
use crate::exit::{Defect, Exit};
use crate::fiber::FiberId;
use crate::interrupt::InterruptStatus;
use crate::sync::Deferred;

type ReleaseFn<E> = Box<dyn FnOnce(&Exit<(), E>) -> BoxFuture<'static, ()> + Send>;

enum Stage<E> {
    Bound(ReleaseFn<E>),
    Running(BoxFuture<'static, Option<Defect>>),
    Finished,
}

/// A release action bound to the resource it frees.
pub(crate) struct Finalizer<E> {
    stage: Mutex<Stage<E>>,
}

impl<E> std::fmt::Debug for Finalizer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match &*self.stage.lock() {
            Stage::Bound(_) => "bound",
            Stage::Running(_) => "running",
            Stage::Finished => "finished",
        };
        f.debug_struct("Finalizer").field("stage", &stage).finish()
    }
}

impl<E> Finalizer<E> {
    fn new(release: ReleaseFn<E>) -> Self {
        Finalizer {
            stage: Mutex::new(Stage::Bound(release)),
        }
    }

    fn is_finished(&self) -> bool {
        matches!(&*self.stage.lock(), Stage::Finished)
    }

    /// Start the release action with `exit`. No-op once started.
    ///
    /// Panics raised by the action, synchronously or while its future is
    /// polled, come back as a defect from `finish`.
    fn start(&self, exit: &Exit<(), E>) {
        let mut stage = self.stage.lock();
        if !matches!(&*stage, Stage::Bound(_)) {
            return;
        }
        let Stage::Bound(release) = std::mem::replace(&mut *stage, Stage::Finished) else {
            return;
        };
        let running: BoxFuture<'static, Option<Defect>> =
            match std::panic::catch_unwind(AssertUnwindSafe(|| release(exit))) {
                Ok(future) => Box::pin(async move {
                    AssertUnwindSafe(future)
                        .catch_unwind()
                        .await
                        .err()
                        .map(Defect::from_panic)
                }),
                Err(payload) => {
                    let defect = Defect::from_panic(payload);
                    Box::pin(async move { Some(defect) })
                }
            };
        *stage = Stage::Running(running);
    }

    /// Drive a started release action to completion.
    ///
    /// The action lives in the finalizer, not in the returned future:
    /// dropping the future part way leaves it resumable by the next caller.
    fn finish(&self) -> impl Future<Output = Option<Defect>> + Send + '_ {
        std::future::poll_fn(move |cx| self.poll_finish(cx))
    }

    fn poll_finish(&self, cx: &mut Context<'_>) -> Poll<Option<Defect>> {
        let mut stage = self.stage.lock();
        let Stage::Running(running) = &mut *stage else {
            return Poll::Ready(None);
        };
        let defect = std::task::ready!(running.as_mut().poll(cx));
        *stage = Stage::Finished;
        Poll::Ready(defect)
    }
}

type Obligation<E> = Arc<Deferred<Option<Finalizer<E>>>>;

/// Write end of one obligation.
///
/// Dropping an unfilled slot records that no resource was produced, so a
/// reservation abandoned mid-acquire never leaves the scope waiting.
#[derive(Debug)]
pub(crate) struct ObligationSlot<E> {
    cell: Obligation<E>,
}

impl<E> ObligationSlot<E> {
    /// Bind the release action to the acquired resource.
    pub(crate) fn bind<F>(self, release: F)
    where
        F: FnOnce(&Exit<(), E>) -> BoxFuture<'static, ()> + Send + 'static,
    {
        let _ = self.cell.complete(Some(Finalizer::new(Box::new(release))));
    }

    /// Record that acquisition produced nothing to release.
    pub(crate) fn vacate(self) {
        let _ = self.cell.complete(None);
    }
}

impl<E> Drop for ObligationSlot<E> {
    fn drop(&mut self) {
        if !self.cell.is_completed() {
            let _ = self.cell.complete(None);
        }
    }
}

/// The release obligations of a single `with` call.
///
/// Dropping a scope that still holds finalizers (because the future driving
/// it was dropped) runs them in the background on the current tokio runtime
/// with an interruption exit, finishing any release that was under way.
pub struct ReleaseScope<E: Send + 'static> {
    obligations: Mutex<Vec<Obligation<E>>>,
    ambient: InterruptStatus,
}

impl<E: Send + 'static> std::fmt::Debug for ReleaseScope<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseScope")
            .field("obligations", &self.len())
            .field("ambient", &self.ambient)
            .finish()
    }
}

impl<E: Send + 'static> Default for ReleaseScope<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Send + 'static> ReleaseScope<E> {
    /// An empty scope whose reservations acquire interruptibly by default.
    pub fn new() -> Self {
        Self::with_ambient(InterruptStatus::Interruptible)
    }

    /// An empty scope for a caller running with `ambient`.
    ///
    /// Reservations without a status of their own acquire with it.
    pub fn with_ambient(ambient: InterruptStatus) -> Self {
        ReleaseScope {
            obligations: Mutex::new(Vec::new()),
            ambient,
        }
    }

    /// The caller's status captured when the scope was opened.
    pub fn ambient(&self) -> InterruptStatus {
        self.ambient
    }

    /// Number of outstanding obligations.
    pub fn len(&self) -> usize {
        self.obligations.lock().len()
    }

    /// Returns `true` when nothing is left to release.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Open a new obligation.
    pub(crate) fn register(&self) -> ObligationSlot<E> {
        let cell = Arc::new(Deferred::new());
        let mut obligations = self.obligations.lock();
        obligations.push(Arc::clone(&cell));
        tracing::debug!(obligation = obligations.len(), "release obligation registered");
        ObligationSlot { cell }
    }

    fn last(&self) -> Option<Obligation<E>> {
        self.obligations.lock().last().cloned()
    }

    /// Release every obligation, most recent first.
    ///
    /// Each finalizer observes `exit`; the exit is handed back together with
    /// the defects raised by finalizers, in the order they were raised.
    pub async fn release_all(&self, exit: Exit<(), E>) -> (Exit<(), E>, Vec<Defect>) {
        let mut defects = Vec::new();
        while let Some(obligation) = self.last() {
            if let Some(finalizer) = obligation.wait().await {
                finalizer.start(&exit);
                if let Some(defect) = finalizer.finish().await {
                    tracing::debug!(%defect, "finalizer raised a defect");
                    defects.push(defect);
                }
            }
            self.obligations.lock().pop();
        }
        (exit, defects)
    }
}

impl<E: Send + 'static> Drop for ReleaseScope<E> {
    fn drop(&mut self) {
        let pending = std::mem::take(self.obligations.get_mut());
        let outstanding = pending
            .iter()
            .filter(|obligation| match obligation.get() {
                Some(None) => false,
                Some(Some(finalizer)) => !finalizer.is_finished(),
                None => true,
            })
            .count();
        if outstanding == 0 {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!(outstanding, "release scope dropped; releasing in the background");
                handle.spawn(async move {
                    let exit = Exit::interrupt(FiberId::NONE);
                    for obligation in pending.iter().rev() {
                        let Some(finalizer) = obligation.wait().await else {
                            continue;
                        };
                        finalizer.start(&exit);
                        if let Some(defect) = finalizer.finish().await {
                            tracing::error!(%defect, "background finalizer raised a defect");
                        }
                    }
                });
            }
            Err(_) => {
                tracing::error!(
                    outstanding,
                    "release scope dropped outside a tokio runtime; finalizers will not run"
                );
            }
        }
    }
}
