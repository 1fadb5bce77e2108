//! Fault-recovery wrapper.
//!
//! [`with_recover`] decorates any [`Invoke`] so that a panic escaping the
//! inner invocation is turned into a result by a recovery function instead
//! of unwinding into the caller.
//!
//! Only panics raised while the wrapped future is being polled are seen.
//! The streaming driver runs its handler on a separate task and re-raises
//! pre-commit panics from its own future, so those are seen too; panics
//! after the envelope was delivered terminate the body stream instead.

use std::panic::AssertUnwindSafe;

use futures_core::future::BoxFuture;
use futures_util::FutureExt;
use tracing::error;

use crate::context::Context;
use crate::error::{Fault, InvokeResult, panic_message};
use crate::handler::Invoke;

pub struct WithRecover<I, F> {
    inner: I,
    recover: F,
}

/// Wrap `inner` so that a panic during its invocation calls
/// `recover(ctx, original_event, fault)` and returns its result.
pub fn with_recover<I, F>(inner: I, recover: F) -> WithRecover<I, F> {
    WithRecover { inner, recover }
}

impl<I, F> WithRecover<I, F> {
    pub fn inner(&self) -> &I {
        &self.inner
    }
}

impl<E, I, F> Invoke<E> for WithRecover<I, F>
where
    E: Clone + Send + 'static,
    I: Invoke<E>,
    F: Fn(&Context, &E, Fault) -> InvokeResult<I::Output> + Send + Sync,
{
    type Output = I::Output;

    fn invoke<'a>(&'a self, ctx: &'a Context, event: E) -> BoxFuture<'a, InvokeResult<I::Output>> {
        Box::pin(async move {
            let original = event.clone();
            let invocation = AssertUnwindSafe(async { self.inner.invoke(ctx, event).await });
            match invocation.catch_unwind().await {
                Ok(result) => result,
                Err(fault) => {
                    error!(
                        fault = panic_message(&fault).unwrap_or("<non-string panic payload>"),
                        "intercepted handler fault"
                    );
                    (self.recover)(ctx, &original, fault)
                }
            }
        })
    }
}
