//! One entry point for every invocation shape.

use std::sync::Arc;

use futures_core::future::BoxFuture;
use lambda_bridge_core::events::{FunctionUrlResponse, HttpV2Response, RestV1Response};
use lambda_bridge_core::{BridgeConfig, InvocationEvent};
use tracing::debug;

use crate::context::Context;
use crate::driver::{
    Driver, FunctionUrlCodec, HttpV2Codec, RestV1Codec, function_url_handler, http_v2_handler,
    rest_v1_handler,
};
use crate::error::InvokeResult;
use crate::handler::{Handler, Invoke};
use crate::stream::{StreamingDriver, StreamingResponse, function_url_streaming_handler};

/// The wire response for an [`InvocationEvent`], tagged by the same shape.
#[derive(Debug)]
pub enum WireResponse {
    RestV1(RestV1Response),
    HttpV2(HttpV2Response),
    FunctionUrl(FunctionUrlResponse),
    FunctionUrlStreaming(StreamingResponse),
}

/// Routes each event to the driver for its shape. All drivers share one
/// handler.
pub struct Adapter<H: ?Sized> {
    rest_v1: Driver<RestV1Codec, H>,
    http_v2: Driver<HttpV2Codec, H>,
    function_url: Driver<FunctionUrlCodec, H>,
    function_url_streaming: StreamingDriver<H>,
}

impl<H: Handler> Adapter<H> {
    pub fn new(handler: H) -> Self {
        Self::with_config(handler, &BridgeConfig::default())
    }

    pub fn with_config(handler: H, config: &BridgeConfig) -> Self {
        Self::shared(Arc::new(handler), config)
    }
}

impl<H: Handler + ?Sized> Adapter<H> {
    /// Build from an already shared handler, e.g. `Arc<dyn Handler>`.
    pub fn shared(handler: Arc<H>, config: &BridgeConfig) -> Self {
        Self {
            rest_v1: rest_v1_handler(Arc::clone(&handler), config),
            http_v2: http_v2_handler(Arc::clone(&handler), config),
            function_url: function_url_handler(Arc::clone(&handler), config),
            function_url_streaming: function_url_streaming_handler(handler, config),
        }
    }
}

impl<H: Handler + ?Sized> Invoke<InvocationEvent> for Adapter<H> {
    type Output = WireResponse;

    fn invoke<'a>(&'a self, ctx: &'a Context, event: InvocationEvent) -> BoxFuture<'a, InvokeResult<WireResponse>> {
        Box::pin(async move {
            debug!(shape = %event.shape(), "dispatching invocation");
            match event {
                InvocationEvent::RestV1(event) => self.rest_v1.invoke(ctx, event).await.map(WireResponse::RestV1),
                InvocationEvent::HttpV2(event) => self.http_v2.invoke(ctx, event).await.map(WireResponse::HttpV2),
                InvocationEvent::FunctionUrl(event) => self
                    .function_url
                    .invoke(ctx, event)
                    .await
                    .map(WireResponse::FunctionUrl),
                InvocationEvent::FunctionUrlStreaming(event) => self
                    .function_url_streaming
                    .invoke(ctx, event)
                    .await
                    .map(WireResponse::FunctionUrlStreaming),
            }
        })
    }
}
