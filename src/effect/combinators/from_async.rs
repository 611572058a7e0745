//! FromAsync - effect from an async function.

use std::future::Future;
use std::marker::PhantomData;

use crate::effect::trait_def::Effect;
use crate::exit::Exit;

/// Effect from an async function.
///
/// The returned future is where interruption happens: inside an
/// interruptible region it is dropped at its next suspension point once an
/// interrupt is delivered. `Err` becomes a typed failure and a panic while
/// polling becomes a defect.
///
/// # Example
///
/// ```rust,ignore
/// use reservoir::effect::prelude::*;
///
/// let effect = from_async::<_, String, (), _, _>(|_| async { Ok(42) });
/// assert_eq!(effect.execute(&()).await, Exit::Success(42));
/// ```
pub struct FromAsync<F, Env> {
    pub(crate) f: F,
    pub(crate) _phantom: PhantomData<Env>,
}

impl<F, Env> std::fmt::Debug for FromAsync<F, Env> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FromAsync")
            .field("f", &"<function>")
            .finish()
    }
}

impl<F, Env> FromAsync<F, Env> {
    /// Create a new FromAsync effect.
    pub fn new(f: F) -> Self {
        FromAsync {
            f,
            _phantom: PhantomData,
        }
    }
}

impl<F, Fut, T, E, Env> Effect for FromAsync<F, Env>
where
    F: FnOnce(&Env) -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    async fn run(self, env: &Env) -> Exit<T, E> {
        (self.f)(env).await.into()
    }
}
