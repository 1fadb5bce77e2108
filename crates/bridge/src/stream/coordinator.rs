use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_core::future::BoxFuture;
use futures_util::FutureExt;
use lambda_bridge_core::events::FunctionUrlRequest;
use lambda_bridge_core::{BridgeConfig, InvocationEvent, Shape};
use lambda_bridge_http::Request;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::capture::{Completion, Outcome, StreamingCapture, StreamingResponse};
use crate::context::Context;
use crate::convert;
use crate::error::{InvokeError, InvokeResult};
use crate::finalize::FinalizeOptions;
use crate::handler::{Handler, Invoke};

/// Drives a handler on its own task and resolves once the response
/// envelope is committed.
///
/// Cancelling the invocation's context before commit resolves the
/// invocation with [`InvokeError::Cancelled`] and cancels the handler's
/// context. Dropping the invocation future before commit does the same.
/// Once committed, the handler keeps running until it returns, and its
/// context is only cancelled if the invocation's context is.
pub struct StreamingDriver<H: ?Sized> {
    handler: Arc<H>,
    split_comma_joined: bool,
    pipe_capacity: usize,
    finalize: FinalizeOptions,
}

impl<H: Handler + ?Sized> StreamingDriver<H> {
    pub fn new(handler: Arc<H>, config: &BridgeConfig) -> Self {
        Self {
            handler,
            split_comma_joined: config.headers.splits(Shape::FunctionUrlStreaming),
            pipe_capacity: config.streaming.pipe_capacity,
            finalize: config.into(),
        }
    }
}

pub fn function_url_streaming_handler<H: Handler + ?Sized>(
    handler: Arc<H>,
    config: &BridgeConfig,
) -> StreamingDriver<H> {
    StreamingDriver::new(handler, config)
}

async fn run_handler<H: Handler + ?Sized>(
    handler: Arc<H>,
    ctx: Context,
    request: Request,
    mut capture: StreamingCapture,
) {
    let completion = match AssertUnwindSafe(async { handler.handle(ctx, request, &mut capture).await })
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => Completion::Returned,
        Ok(Err(e)) => Completion::Failed(e),
        Err(fault) => Completion::Faulted(fault),
    };
    capture.close(completion).await;
}

impl<H: Handler + ?Sized> Invoke<FunctionUrlRequest> for StreamingDriver<H> {
    type Output = StreamingResponse;

    fn invoke<'a>(
        &'a self,
        ctx: &'a Context,
        event: FunctionUrlRequest,
    ) -> BoxFuture<'a, InvokeResult<StreamingResponse>> {
        Box::pin(async move {
            let request = convert::function_url(&event, self.split_comma_joined).inspect_err(|e| {
                warn!(shape = %Shape::FunctionUrlStreaming, error = %e, "event conversion failed");
            })?;

            let handler_ctx = ctx
                .child()
                .with_source_event(InvocationEvent::FunctionUrlStreaming(event));
            let abandon = handler_ctx.cancellation_token().clone().drop_guard();

            let (outcome_tx, outcome_rx) = oneshot::channel();
            let capture = StreamingCapture::new(outcome_tx, self.pipe_capacity, self.finalize);
            tokio::spawn(run_handler(Arc::clone(&self.handler), handler_ctx, request, capture));

            // Cancellation is checked first: a handler woken by the same
            // cancellation may commit in the meantime, and that commit must
            // not win.
            let outcome = tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    debug!("streaming invocation cancelled before commit");
                    return Err(InvokeError::Cancelled);
                }
                outcome = outcome_rx => outcome,
            };

            match outcome {
                Ok(Outcome::Committed(response)) => {
                    abandon.disarm();
                    Ok(response)
                }
                Ok(Outcome::Failed(e)) => {
                    warn!(shape = %Shape::FunctionUrlStreaming, error = %e, "handler failed before commit");
                    Err(InvokeError::Handler(e))
                }
                // Re-raised here so a recovery wrapper around this invocation
                // sees the handler's panic.
                Ok(Outcome::Faulted(fault)) => std::panic::resume_unwind(fault),
                Err(_) => Err(InvokeError::Abandoned),
            }
        })
    }
}
