//! Canonical HTTP types for lambda-bridge.
//!
//! Provides the [`Request`] a handler receives, the [`ResponseCapture`]
//! contract it writes its response into, and the helpers finalizers use to
//! turn a captured body into a wire body ([`sniff`]).
//!
//! # Body model
//!
//! Request bodies arrive fully decoded from the invocation event. The
//! [`Request::body_stream()`] method yields the buffer in fixed-size
//! chunks via zero-copy `Bytes::slice()`.
//!
//! Response bodies go wherever the capture sends them: into memory for
//! [`BufferedCapture`], or through a bounded pipe to the consumer for the
//! engine's streaming capture, in which case a write waits until the
//! consumer has room.

pub(crate) mod body;
pub mod capture;
mod error;
mod header;
mod request;
pub mod sniff;

pub use body::{ByteStream, DEFAULT_CHUNK_SIZE};
pub use capture::{BufferedCapture, BufferedParts, Committed, DEFAULT_STATUS, ResponseCapture};
pub use error::Error;
pub use header::{Header, HeaderMap, canonical_name};
pub use request::{Request, parse_http_version};
