//! Pure effect - wraps a value as an effect with no side effects.

use std::marker::PhantomData;

use crate::effect::trait_def::Effect;
use crate::exit::Exit;

/// A pure value wrapped as an Effect.
///
/// Zero-cost: the `Pure` struct stores only the value itself plus phantom
/// data for type parameters. It never suspends, so nothing interrupts it
/// mid-way; an interrupt pending when it runs is delivered by the enclosing
/// region instead.
///
/// # Example
///
/// ```rust,ignore
/// use reservoir::effect::prelude::*;
///
/// let effect = pure::<_, String, ()>(42);
/// assert_eq!(effect.execute(&()).await, Exit::Success(42));
/// ```
#[derive(Debug, Clone)]
pub struct Pure<T, E, Env> {
    value: T,
    _phantom: PhantomData<(E, Env)>,
}

impl<T, E, Env> Pure<T, E, Env> {
    /// Create a new Pure effect from a value.
    pub fn new(value: T) -> Self {
        Pure {
            value,
            _phantom: PhantomData,
        }
    }
}

impl<T, E, Env> Effect for Pure<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    async fn run(self, _env: &Self::Env) -> Exit<T, E> {
        Exit::Success(self.value)
    }
}
