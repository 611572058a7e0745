//! Map combinator - transforms the success value of an effect.

use crate::effect::trait_def::Effect;
use crate::exit::Exit;

/// Map combinator - transforms the success value.
///
/// Only a success reaches `f`. Typed failures, interruptions and defects
/// pass through with their cause untouched. A panic in `f` becomes a defect
/// at the nearest catch point (the fiber, or the body of a `with`).
///
/// # Example
///
/// ```rust,ignore
/// use reservoir::effect::prelude::*;
///
/// let effect = pure::<_, String, ()>(21).map(|x| x * 2);
/// assert_eq!(effect.execute(&()).await, Exit::Success(42));
/// ```
pub struct Map<Inner, F> {
    pub(crate) inner: Inner,
    pub(crate) f: F,
}

impl<Inner, F> std::fmt::Debug for Map<Inner, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("inner", &"<effect>")
            .field("f", &"<function>")
            .finish()
    }
}

impl<Inner, F, U> Effect for Map<Inner, F>
where
    Inner: Effect,
    F: FnOnce(Inner::Output) -> U + Send,
    U: Send,
{
    type Output = U;
    type Error = Inner::Error;
    type Env = Inner::Env;

    async fn run(self, env: &Self::Env) -> Exit<U, Self::Error> {
        self.inner.run(env).await.map(self.f)
    }
}
