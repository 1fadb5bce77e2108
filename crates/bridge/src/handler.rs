//! The two seams of the engine.
//!
//! [`Handler`] is what users plug in: request-handling logic that reads a
//! canonical [`Request`] and writes into a [`ResponseCapture`].
//! [`Invoke`] is what the engine hands back: one function per invocation
//! shape, turning an event into that shape's wire response.

use std::sync::Arc;

use futures_core::future::BoxFuture;
use lambda_bridge_http::{Request, ResponseCapture};

use crate::context::Context;
use crate::error::InvokeResult;

/// Request-handling logic bridged by the engine.
///
/// Called exactly once per invocation. Returning an error discards whatever
/// was captured (or, once a streaming response is committed, terminates the
/// body stream with that error). Panics are not caught by the engine; wrap
/// the invocation with [`with_recover`](crate::with_recover) to handle them.
pub trait Handler: Send + Sync + 'static {
    fn handle<'a>(
        &'a self,
        ctx: Context,
        request: Request,
        response: &'a mut dyn ResponseCapture,
    ) -> BoxFuture<'a, anyhow::Result<()>>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle<'a>(
        &'a self,
        ctx: Context,
        request: Request,
        response: &'a mut dyn ResponseCapture,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        (**self).handle(ctx, request, response)
    }
}

/// A uniform invocation function for events of type `E`.
pub trait Invoke<E: Send + 'static>: Send + Sync {
    type Output: Send;

    fn invoke<'a>(&'a self, ctx: &'a Context, event: E) -> BoxFuture<'a, InvokeResult<Self::Output>>;
}
