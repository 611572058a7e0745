//! Combinators for [`Managed`] recipes.
//!
//! All of them reserve into the caller's [`ReleaseScope`], so resources
//! acquired by any part of a composed recipe are released together, most
//! recent first.

use crate::exit::Exit;
use crate::managed::scope::ReleaseScope;
use crate::managed::Managed;

/// Recipe created by [`ManagedExt::map`](crate::managed::ManagedExt::map).
pub struct Map<M, F> {
    pub(crate) inner: M,
    pub(crate) f: F,
}

impl<M, F> std::fmt::Debug for Map<M, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("inner", &"<managed>")
            .field("f", &"<function>")
            .finish()
    }
}

impl<M, F, B> Managed for Map<M, F>
where
    M: Managed,
    F: FnOnce(&M::Output) -> B + Send,
    B: Send,
{
    type Output = B;
    type Error = M::Error;
    type Env = M::Env;

    async fn reserve<K, G>(
        self,
        env: &Self::Env,
        scope: &ReleaseScope<Self::Error>,
        k: G,
    ) -> Exit<K, Self::Error>
    where
        G: FnOnce(&Self::Output) -> K + Send,
        K: Send,
    {
        let f = self.f;
        self.inner.reserve(env, scope, move |a| k(&f(a))).await
    }
}

/// Recipe created by [`ManagedExt::flat_map`](crate::managed::ManagedExt::flat_map).
pub struct FlatMap<M, F> {
    pub(crate) inner: M,
    pub(crate) f: F,
}

impl<M, F> std::fmt::Debug for FlatMap<M, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatMap")
            .field("inner", &"<managed>")
            .field("f", &"<function>")
            .finish()
    }
}

impl<M, F, N> Managed for FlatMap<M, F>
where
    M: Managed,
    F: FnOnce(&M::Output) -> N + Send,
    N: Managed<Error = M::Error, Env = M::Env>,
{
    type Output = N::Output;
    type Error = M::Error;
    type Env = M::Env;

    async fn reserve<K, G>(
        self,
        env: &Self::Env,
        scope: &ReleaseScope<Self::Error>,
        k: G,
    ) -> Exit<K, Self::Error>
    where
        G: FnOnce(&Self::Output) -> K + Send,
        K: Send,
    {
        match self.inner.reserve(env, scope, self.f).await {
            Exit::Success(next) => next.reserve(env, scope, k).await,
            Exit::Failure(cause) => Exit::Failure(cause),
        }
    }
}

/// Recipe created by [`ManagedExt::zip_with`](crate::managed::ManagedExt::zip_with).
pub struct ZipWith<L, R, F> {
    pub(crate) left: L,
    pub(crate) right: R,
    pub(crate) f: F,
}

impl<L, R, F> std::fmt::Debug for ZipWith<L, R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipWith")
            .field("left", &"<managed>")
            .field("right", &"<managed>")
            .field("f", &"<function>")
            .finish()
    }
}

impl<L, R, F, C> Managed for ZipWith<L, R, F>
where
    L: Managed,
    L::Output: Clone,
    R: Managed<Error = L::Error, Env = L::Env>,
    F: FnOnce(&L::Output, &R::Output) -> C + Send,
    C: Send,
{
    type Output = C;
    type Error = L::Error;
    type Env = L::Env;

    async fn reserve<K, G>(
        self,
        env: &Self::Env,
        scope: &ReleaseScope<Self::Error>,
        k: G,
    ) -> Exit<K, Self::Error>
    where
        G: FnOnce(&Self::Output) -> K + Send,
        K: Send,
    {
        let left = match self.left.reserve(env, scope, |left: &L::Output| left.clone()).await {
            Exit::Success(left) => left,
            Exit::Failure(cause) => return Exit::Failure(cause),
        };
        let f = self.f;
        self.right
            .reserve(env, scope, move |right| k(&f(&left, right)))
            .await
    }
}
