//! Never - an effect that suspends forever.

use std::marker::PhantomData;

use crate::effect::trait_def::Effect;
use crate::exit::Exit;

/// An effect that never completes.
///
/// Only interruption ends it, so it must run in an interruptible region to
/// be of any use. Handy for modelling a resource user that waits until it is
/// cancelled.
#[derive(Debug, Clone)]
pub struct Never<T, E, Env> {
    _phantom: PhantomData<(T, E, Env)>,
}

impl<T, E, Env> Never<T, E, Env> {
    /// Create a new Never effect.
    pub fn new() -> Self {
        Never {
            _phantom: PhantomData,
        }
    }
}

impl<T, E, Env> Default for Never<T, E, Env> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E, Env> Effect for Never<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    async fn run(self, _env: &Self::Env) -> Exit<T, E> {
        std::future::pending().await
    }
}
