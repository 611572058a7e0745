//! CheckInterruptible - reads the calling fiber's interrupt status.

use std::marker::PhantomData;

use crate::effect::region::ambient_status;
use crate::effect::trait_def::Effect;
use crate::exit::Exit;
use crate::interrupt::InterruptStatus;

/// Effect producing the [`InterruptStatus`] of the region it runs in.
///
/// Outside any fiber the status is [`InterruptStatus::Interruptible`].
#[derive(Debug, Clone)]
pub struct CheckInterruptible<E, Env> {
    _phantom: PhantomData<(E, Env)>,
}

impl<E, Env> CheckInterruptible<E, Env> {
    /// Create a new CheckInterruptible effect.
    pub fn new() -> Self {
        CheckInterruptible {
            _phantom: PhantomData,
        }
    }
}

impl<E, Env> Default for CheckInterruptible<E, Env> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, Env> Effect for CheckInterruptible<E, Env>
where
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = InterruptStatus;
    type Error = E;
    type Env = Env;

    async fn run(self, _env: &Self::Env) -> Exit<InterruptStatus, E> {
        Exit::Success(ambient_status())
    }
}
