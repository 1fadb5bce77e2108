//! Streaming responses.
//!
//! The handler runs on its own task against a [`StreamingCapture`]. The
//! invocation resolves as soon as the capture commits (first write or
//! status), handing back a [`StreamingResponse`] whose [`BodyStream`]
//! yields the bytes the handler keeps writing.
//!
//! ```text
//!  invoke()                          handler task
//!     │  spawn ─────────────────────────▶ │
//!     │                                   │ write("a")  ── commit
//!     │ ◀──── Outcome::Committed ──────── │
//!  StreamingResponse                      │ write("b")
//!     │ body.next() ◀──── pipe ────────── │ write("c")
//!     │ body.next() ◀──── (closed) ────── │ return
//! ```
//!
//! The pipe is a bounded channel, so a consumer that stops reading stalls
//! the handler's writes instead of buffering without limit.

mod capture;
mod coordinator;

pub use capture::{BodyStream, StreamingCapture, StreamingResponse};
pub use coordinator::{StreamingDriver, function_url_streaming_handler};
