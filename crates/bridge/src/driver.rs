//! Generic handler driver for the buffered shapes.
//!
//! A [`Driver`] pairs a [`ShapeCodec`] (how to convert the shape's event and
//! how to finalize its response) with a [`Handler`]. Every buffered shape
//! runs through the same invoke path:
//!
//! ```text
//! event ──convert──▶ Request ──handler──▶ BufferedCapture ──finalize──▶ wire response
//!   └──────────────── attached to Context as the source event
//! ```

use std::sync::Arc;

use futures_core::future::BoxFuture;
use lambda_bridge_core::events::{
    FunctionUrlRequest, FunctionUrlResponse, HttpV2Request, HttpV2Response, RestV1Request,
    RestV1Response,
};
use lambda_bridge_core::{BridgeConfig, InvocationEvent, Shape};
use lambda_bridge_http::{BufferedCapture, BufferedParts, Request};
use tracing::{debug, warn};

use crate::context::Context;
use crate::convert;
use crate::error::{ConversionError, InvokeError, InvokeResult};
use crate::finalize::{self, FinalizeOptions};
use crate::handler::{Handler, Invoke};

/// Per-shape conversion and finalization.
pub trait ShapeCodec: Send + Sync + 'static {
    type Event: Send + 'static;
    type Response: Send;

    const SHAPE: Shape;

    fn convert(&self, event: &Self::Event) -> Result<Request, ConversionError>;

    /// Wrap the shape's event into the tagged union carried by [`Context`].
    fn source(event: Self::Event) -> InvocationEvent;

    fn init_capture(&self) -> BufferedCapture {
        BufferedCapture::new()
    }

    fn finalize(&self, parts: BufferedParts) -> Self::Response;
}

#[derive(Debug, Clone, Default)]
pub struct RestV1Codec {
    pub finalize: FinalizeOptions,
}

impl ShapeCodec for RestV1Codec {
    type Event = RestV1Request;
    type Response = RestV1Response;

    const SHAPE: Shape = Shape::RestV1;

    fn convert(&self, event: &RestV1Request) -> Result<Request, ConversionError> {
        convert::rest_v1(event)
    }

    fn source(event: RestV1Request) -> InvocationEvent {
        InvocationEvent::RestV1(event)
    }

    fn finalize(&self, parts: BufferedParts) -> RestV1Response {
        finalize::rest_v1(parts, self.finalize)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpV2Codec {
    pub split_comma_joined: bool,
    pub finalize: FinalizeOptions,
}

impl ShapeCodec for HttpV2Codec {
    type Event = HttpV2Request;
    type Response = HttpV2Response;

    const SHAPE: Shape = Shape::HttpV2;

    fn convert(&self, event: &HttpV2Request) -> Result<Request, ConversionError> {
        convert::http_v2(event, self.split_comma_joined)
    }

    fn source(event: HttpV2Request) -> InvocationEvent {
        InvocationEvent::HttpV2(event)
    }

    fn finalize(&self, parts: BufferedParts) -> HttpV2Response {
        finalize::http_v2(parts, self.finalize)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunctionUrlCodec {
    pub split_comma_joined: bool,
    pub finalize: FinalizeOptions,
}

impl ShapeCodec for FunctionUrlCodec {
    type Event = FunctionUrlRequest;
    type Response = FunctionUrlResponse;

    const SHAPE: Shape = Shape::FunctionUrl;

    fn convert(&self, event: &FunctionUrlRequest) -> Result<Request, ConversionError> {
        convert::function_url(event, self.split_comma_joined)
    }

    fn source(event: FunctionUrlRequest) -> InvocationEvent {
        InvocationEvent::FunctionUrl(event)
    }

    fn finalize(&self, parts: BufferedParts) -> FunctionUrlResponse {
        finalize::function_url(parts, self.finalize)
    }
}

/// Runs a handler once per event against an in-memory capture.
pub struct Driver<C, H: ?Sized> {
    codec: C,
    handler: Arc<H>,
}

impl<C: ShapeCodec, H: Handler + ?Sized> Driver<C, H> {
    pub fn new(codec: C, handler: Arc<H>) -> Self {
        Self { codec, handler }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }
}

impl<C: ShapeCodec, H: Handler + ?Sized> Invoke<C::Event> for Driver<C, H> {
    type Output = C::Response;

    fn invoke<'a>(&'a self, ctx: &'a Context, event: C::Event) -> BoxFuture<'a, InvokeResult<C::Response>> {
        Box::pin(async move {
            let request = self.codec.convert(&event).inspect_err(|e| {
                warn!(shape = %C::SHAPE, error = %e, "event conversion failed");
            })?;

            let ctx = ctx.with_source_event(C::source(event));
            let mut capture = self.codec.init_capture();
            if let Err(e) = self.handler.handle(ctx, request, &mut capture).await {
                warn!(shape = %C::SHAPE, error = %e, "handler failed");
                return Err(InvokeError::Handler(e));
            }

            let parts = capture.into_parts();
            debug!(shape = %C::SHAPE, status = parts.status, bytes = parts.body.len(), "invocation complete");
            Ok(self.codec.finalize(parts))
        })
    }
}

pub fn rest_v1_handler<H: Handler + ?Sized>(handler: Arc<H>, config: &BridgeConfig) -> Driver<RestV1Codec, H> {
    let codec = RestV1Codec {
        finalize: config.into(),
    };
    Driver::new(codec, handler)
}

pub fn http_v2_handler<H: Handler + ?Sized>(handler: Arc<H>, config: &BridgeConfig) -> Driver<HttpV2Codec, H> {
    let codec = HttpV2Codec {
        split_comma_joined: config.headers.splits(Shape::HttpV2),
        finalize: config.into(),
    };
    Driver::new(codec, handler)
}

pub fn function_url_handler<H: Handler + ?Sized>(
    handler: Arc<H>,
    config: &BridgeConfig,
) -> Driver<FunctionUrlCodec, H> {
    let codec = FunctionUrlCodec {
        split_comma_joined: config.headers.splits(Shape::FunctionUrl),
        finalize: config.into(),
    };
    Driver::new(codec, handler)
}
