//! Running a managed recipe: acquire, use, release.

use crate::effect::region::{ambient_status, catch_defect, honor_pending, run_masked, run_region};
use crate::effect::trait_def::Effect;
use crate::exit::Exit;
use crate::interrupt::InterruptStatus;
use crate::managed::scope::ReleaseScope;
use crate::managed::Managed;

/// Effect created by [`ManagedExt::with`](crate::managed::ManagedExt::with).
pub struct With<M, F> {
    pub(crate) managed: M,
    pub(crate) body: F,
}

impl<M, F> std::fmt::Debug for With<M, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("With")
            .field("managed", &"<managed>")
            .field("body", &"<function>")
            .finish()
    }
}

impl<M, F, U> Effect for With<M, F>
where
    M: Managed,
    F: FnOnce(&M::Output) -> U + Send,
    U: Effect<Error = M::Error, Env = M::Env>,
{
    type Output = U::Output;
    type Error = M::Error;
    type Env = M::Env;

    async fn run(self, env: &Self::Env) -> Exit<Self::Output, Self::Error> {
        let ambient = ambient_status();
        let With { managed, body } = self;

        let exit = run_masked(async move {
            let scope = ReleaseScope::with_ambient(ambient);

            let exit = match managed.reserve(env, &scope, body).await {
                Exit::Success(usage) => catch_defect(run_region(ambient, usage.run(env))).await,
                Exit::Failure(cause) => Exit::Failure(cause),
            };

            let (value, shape) = exit.split();
            let (shape, defects) = run_masked(scope.release_all(shape)).await;
            if !defects.is_empty() {
                tracing::warn!(count = defects.len(), "finalizers raised defects");
            }
            Exit::rejoin(value, shape).with_release_defects(defects)
        })
        .await;
        honor_pending(exit)
    }
}
