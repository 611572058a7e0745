//! Fail and Die effects - computations that never succeed.

use std::marker::PhantomData;

use crate::effect::trait_def::Effect;
use crate::exit::{Defect, Exit};

/// An effect that fails with a typed error.
///
/// # Example
///
/// ```rust,ignore
/// use reservoir::effect::prelude::*;
///
/// let effect = fail::<i32, _, ()>("error".to_string());
/// assert_eq!(effect.execute(&()).await, Exit::fail("error".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct Fail<T, E, Env> {
    error: E,
    _phantom: PhantomData<(T, Env)>,
}

impl<T, E, Env> Fail<T, E, Env> {
    /// Create a new Fail effect from an error.
    pub fn new(error: E) -> Self {
        Fail {
            error,
            _phantom: PhantomData,
        }
    }
}

impl<T, E, Env> Effect for Fail<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    async fn run(self, _env: &Self::Env) -> Exit<T, E> {
        Exit::fail(self.error)
    }
}

/// An effect that dies with a defect.
#[derive(Debug, Clone)]
pub struct Die<T, E, Env> {
    defect: Defect,
    _phantom: PhantomData<(T, E, Env)>,
}

impl<T, E, Env> Die<T, E, Env> {
    /// Create a new Die effect from a defect.
    pub fn new(defect: Defect) -> Self {
        Die {
            defect,
            _phantom: PhantomData,
        }
    }
}

impl<T, E, Env> Effect for Die<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    async fn run(self, _env: &Self::Env) -> Exit<T, E> {
        Exit::die(self.defect)
    }
}
