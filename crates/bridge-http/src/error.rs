use std::fmt;

/// Error carried by body streams and response-capture writes.
///
/// Request bodies yield it when the event body cannot be decoded; streaming
/// response bodies yield it when the handler fails after the envelope was
/// already delivered; writes return it once the consumer has gone away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    message: String,
}

impl Error {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The body consumer dropped its end of the pipe.
    pub fn closed() -> Self {
        Self::new("response body closed by consumer")
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
