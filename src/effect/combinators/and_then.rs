//! AndThen combinator - chains dependent effects.

use crate::effect::trait_def::Effect;
use crate::exit::Exit;

/// AndThen combinator - chains dependent effects.
///
/// The error type of the chained effect must match the error type
/// of the original effect. Use `map_err` to convert error types
/// before chaining.
///
/// # Example
///
/// ```rust,ignore
/// use reservoir::effect::prelude::*;
///
/// let effect = pure::<_, String, ()>(21)
///     .and_then(|x| pure(x * 2));
/// assert_eq!(effect.execute(&()).await, Exit::Success(42));
/// ```
pub struct AndThen<Inner, F> {
    pub(crate) inner: Inner,
    pub(crate) f: F,
}

impl<Inner, F> std::fmt::Debug for AndThen<Inner, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AndThen")
            .field("inner", &"<effect>")
            .field("f", &"<function>")
            .finish()
    }
}

impl<Inner, F, E2> Effect for AndThen<Inner, F>
where
    Inner: Effect,
    E2: Effect<Error = Inner::Error, Env = Inner::Env>,
    F: FnOnce(Inner::Output) -> E2 + Send,
{
    type Output = E2::Output;
    type Error = Inner::Error;
    type Env = Inner::Env;

    async fn run(self, env: &Self::Env) -> Exit<Self::Output, Self::Error> {
        match self.inner.run(env).await {
            Exit::Success(value) => (self.f)(value).run(env).await,
            Exit::Failure(cause) => Exit::Failure(cause),
        }
    }
}
