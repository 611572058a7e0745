//! Tracing support for effects.
//!
//! This module provides the `Instrument` combinator and `instrument` method
//! for wrapping effects in tracing spans.

use crate::effect::trait_def::Effect;
use crate::exit::Exit;

/// An effect wrapped in a tracing span.
///
/// Created by [`EffectTracingExt::instrument`].
#[derive(Debug)]
pub struct Instrument<E> {
    pub(crate) inner: E,
    pub(crate) span: tracing::Span,
}

impl<E> Effect for Instrument<E>
where
    E: Effect,
{
    type Output = E::Output;
    type Error = E::Error;
    type Env = E::Env;

    async fn run(self, env: &Self::Env) -> Exit<Self::Output, Self::Error> {
        use tracing::Instrument as _;
        self.inner.run(env).instrument(self.span).await
    }
}

/// Extension trait for adding tracing instrumentation to effects.
pub trait EffectTracingExt: Effect {
    /// Wrap this effect in a tracing span.
    ///
    /// The span is entered whenever the effect's future is polled, so
    /// events logged by acquire and release code carry its fields.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use reservoir::effect::prelude::*;
    /// use tracing::debug_span;
    ///
    /// fn open_file(path: String) -> impl Effect<Output = File, Error = IoError, Env = Env> {
    ///     let span_path = path.clone();
    ///     from_fn(move |env: &Env| env.fs.open(&path))
    ///         .instrument(debug_span!("open_file", path = %span_path))
    /// }
    /// ```
    fn instrument(self, span: tracing::Span) -> Instrument<Self> {
        Instrument { inner: self, span }
    }
}

impl<E: Effect> EffectTracingExt for E {}
