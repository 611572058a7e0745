//! FromFn - effect from a synchronous function.

use std::marker::PhantomData;

use crate::effect::trait_def::Effect;
use crate::exit::Exit;

/// Effect from a synchronous function.
///
/// The function receives the environment and returns a `Result`; `Err`
/// becomes a typed failure. The call does not suspend, so an interrupt can
/// only land before or after it. A panic becomes a defect once it reaches
/// the enclosing fiber or `with`.
///
/// # Example
///
/// ```rust,ignore
/// use reservoir::effect::prelude::*;
///
/// #[derive(Clone)]
/// struct Env { value: i32 }
///
/// let effect = from_fn::<_, String, _, _>(|env: &Env| Ok(env.value * 2));
/// assert_eq!(effect.execute(&Env { value: 21 }).await, Exit::Success(42));
/// ```
pub struct FromFn<F, Env> {
    pub(crate) f: F,
    pub(crate) _phantom: PhantomData<Env>,
}

impl<F, Env> std::fmt::Debug for FromFn<F, Env> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FromFn").field("f", &"<function>").finish()
    }
}

impl<F, Env> FromFn<F, Env> {
    /// Create a new FromFn effect.
    pub fn new(f: F) -> Self {
        FromFn {
            f,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, E, Env> Effect for FromFn<F, Env>
where
    F: FnOnce(&Env) -> Result<T, E> + Send,
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    async fn run(self, env: &Env) -> Exit<T, E> {
        (self.f)(env).into()
    }
}
