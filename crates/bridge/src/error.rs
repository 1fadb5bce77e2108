//! Invocation error taxonomy.

use std::any::Any;

use thiserror::Error;

/// A panic payload caught from a handler.
pub type Fault = Box<dyn Any + Send + 'static>;

/// The event could not be turned into a request; the handler never ran.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid request URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Why an invocation produced no wire response.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The handler returned an error (before commit, for streaming).
    #[error(transparent)]
    Handler(#[from] anyhow::Error),

    /// The invocation's context was cancelled before a response existed.
    #[error("invocation cancelled")]
    Cancelled,

    /// The streaming handler task went away without reporting an outcome,
    /// e.g. because the runtime is shutting down.
    #[error("streaming handler task ended without reporting a result")]
    Abandoned,
}

pub type InvokeResult<T> = Result<T, InvokeError>;

/// The message of a `panic!("...")` or `panic!("{}", ..)` payload.
pub fn panic_message(fault: &Fault) -> Option<&str> {
    if let Some(s) = fault.downcast_ref::<&'static str>() {
        return Some(*s);
    }
    fault.downcast_ref::<String>().map(String::as_str)
}
