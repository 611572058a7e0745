//! MapErr combinator - transforms the typed errors of an effect.

use crate::effect::trait_def::Effect;
use crate::exit::Exit;

/// MapErr combinator - transforms typed failures.
///
/// Interruptions and defects pass through untouched. The function may run
/// more than once when the cause aggregates several failures.
///
/// # Example
///
/// ```rust,ignore
/// use reservoir::effect::prelude::*;
///
/// let effect = fail::<i32, _, ()>("error")
///     .map_err(|e: &str| format!("wrapped: {}", e));
/// assert_eq!(effect.execute(&()).await, Exit::fail("wrapped: error".to_string()));
/// ```
pub struct MapErr<Inner, F> {
    pub(crate) inner: Inner,
    pub(crate) f: F,
}

impl<Inner, F> std::fmt::Debug for MapErr<Inner, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapErr")
            .field("inner", &"<effect>")
            .field("f", &"<function>")
            .finish()
    }
}

impl<Inner, F, E2> Effect for MapErr<Inner, F>
where
    Inner: Effect,
    F: FnMut(Inner::Error) -> E2 + Send,
    E2: Send,
{
    type Output = Inner::Output;
    type Error = E2;
    type Env = Inner::Env;

    async fn run(self, env: &Self::Env) -> Exit<Self::Output, E2> {
        self.inner.run(env).await.map_err(self.f)
    }
}
