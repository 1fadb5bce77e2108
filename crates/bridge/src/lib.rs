//! lambda-bridge: run HTTP handlers behind serverless invocation events.
//!
//! Each invocation arrives as an event in one of several platform shapes
//! (REST v1, HTTP v2, function URL, streaming function URL). The engine
//! converts it into a canonical [`Request`](lambda_bridge_http::Request),
//! runs a [`Handler`] against a response capture, and turns what the
//! handler wrote into the shape's wire response.
//!
//! # Architecture
//!
//! ```text
//! InvocationEvent
//!   │
//!   ▼
//! Adapter ──┬── Driver<RestV1Codec>      ─┐
//!           ├── Driver<HttpV2Codec>       ├─ convert → Handler → BufferedCapture → finalize
//!           ├── Driver<FunctionUrlCodec> ─┘
//!           └── StreamingDriver           ── convert → spawn Handler → StreamingCapture
//!                                                         │ commit
//!                                                         ▼
//!                                              StreamingResponse { envelope, BodyStream }
//! ```
//!
//! Panics from handlers are not caught unless the invocation is wrapped
//! with [`with_recover`].

pub mod adapter;
pub mod context;
pub mod convert;
pub mod driver;
pub mod error;
pub mod finalize;
pub mod handler;
pub mod recover;
pub mod stream;

pub use adapter::{Adapter, WireResponse};
pub use context::Context;
pub use driver::{
    Driver, FunctionUrlCodec, HttpV2Codec, RestV1Codec, ShapeCodec, function_url_handler,
    http_v2_handler, rest_v1_handler,
};
pub use error::{ConversionError, Fault, InvokeError, InvokeResult, panic_message};
pub use handler::{Handler, Invoke};
pub use recover::{WithRecover, with_recover};
pub use stream::{BodyStream, StreamingCapture, StreamingDriver, StreamingResponse, function_url_streaming_handler};

pub use lambda_bridge_core::{BridgeConfig, InvocationEvent, Shape};
pub use lambda_bridge_http::{Request, ResponseCapture};
