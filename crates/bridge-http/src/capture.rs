//! Response capture: the sink a handler writes its response into.
//!
//! A capture starts *open*: the handler may edit headers and pick a status.
//! The first [`write`](ResponseCapture::write) or
//! [`set_status`](ResponseCapture::set_status) *commits* it, freezing status
//! and a snapshot of the headers. From then on header edits and status
//! changes have no effect on the response; only body bytes flow.

use bytes::{Bytes, BytesMut};
use futures_core::future::BoxFuture;

use crate::Error;
use crate::header::HeaderMap;

/// Status used when a handler writes without setting one.
pub const DEFAULT_STATUS: u16 = 200;

/// The sink handlers write their response into.
///
/// Implemented by [`BufferedCapture`] (whole body kept in memory) and by the
/// engine's streaming capture (body forwarded to the consumer as written).
pub trait ResponseCapture: Send {
    /// Current headers: the live map before commit, the snapshot after.
    fn headers(&self) -> &HeaderMap;

    /// Mutable access to the live header map. Edits made after commit are
    /// not part of the response.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// The committed status, or the status a write would commit.
    fn status(&self) -> u16;

    /// Commit with `status`. Ignored once committed.
    fn set_status(&mut self, status: u16);

    /// Append body bytes, committing with [`DEFAULT_STATUS`] first if needed.
    fn write(&mut self, chunk: Bytes) -> BoxFuture<'_, Result<(), Error>>;

    fn is_committed(&self) -> bool;
}

/// Status and header snapshot frozen at commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub status: u16,
    pub headers: HeaderMap,
}

/// What a finalizer receives from a [`BufferedCapture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedParts {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Synchronous capture: the whole body is kept in memory until the handler
/// returns.
#[derive(Debug, Default)]
pub struct BufferedCapture {
    headers: HeaderMap,
    committed: Option<Committed>,
    body: BytesMut,
}

impl BufferedCapture {
    pub fn new() -> Self {
        Self::default()
    }

    fn commit(&mut self, status: u16) {
        if self.committed.is_none() {
            self.committed = Some(Committed {
                status,
                headers: self.headers.clone(),
            });
        }
    }

    /// Hand status, headers and body to a finalizer. A capture that was
    /// never committed finalizes as [`DEFAULT_STATUS`] with its live headers.
    pub fn into_parts(self) -> BufferedParts {
        let Committed { status, headers } = self.committed.unwrap_or(Committed {
            status: DEFAULT_STATUS,
            headers: self.headers,
        });
        BufferedParts {
            status,
            headers,
            body: self.body.freeze(),
        }
    }
}

impl ResponseCapture for BufferedCapture {
    fn headers(&self) -> &HeaderMap {
        match &self.committed {
            Some(committed) => &committed.headers,
            None => &self.headers,
        }
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn status(&self) -> u16 {
        self.committed
            .as_ref()
            .map_or(DEFAULT_STATUS, |committed| committed.status)
    }

    fn set_status(&mut self, status: u16) {
        self.commit(status);
    }

    fn write(&mut self, chunk: Bytes) -> BoxFuture<'_, Result<(), Error>> {
        self.commit(DEFAULT_STATUS);
        self.body.extend_from_slice(&chunk);
        Box::pin(std::future::ready(Ok(())))
    }

    fn is_committed(&self) -> bool {
        self.committed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_capture_defaults_to_200() {
        let parts = BufferedCapture::new().into_parts();
        assert_eq!(parts.status, 200);
        assert!(parts.headers.is_empty());
        assert!(parts.body.is_empty());
    }

    #[test]
    fn headers_without_write_are_kept() {
        let mut capture = BufferedCapture::new();
        capture.headers_mut().set("X-Only", "headers");
        assert!(!capture.is_committed());

        let parts = capture.into_parts();
        assert_eq!(parts.status, 200);
        assert_eq!(parts.headers.get("x-only"), Some("headers"));
    }

    #[tokio::test]
    async fn write_commits_default_status() {
        let mut capture = BufferedCapture::new();
        capture.write(Bytes::from_static(b"hello ")).await.unwrap();
        capture.write(Bytes::from_static(b"world")).await.unwrap();
        assert!(capture.is_committed());

        capture.set_status(500);
        assert_eq!(capture.status(), 200);

        let parts = capture.into_parts();
        assert_eq!(parts.status, 200);
        assert_eq!(parts.body.as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn first_status_wins() {
        let mut capture = BufferedCapture::new();
        capture.set_status(201);
        capture.set_status(404);
        capture.write(Bytes::from_static(b"{}")).await.unwrap();

        assert_eq!(capture.into_parts().status, 201);
    }

    #[tokio::test]
    async fn headers_frozen_at_commit() {
        let mut capture = BufferedCapture::new();
        capture.headers_mut().set("Content-Type", "text/plain");
        capture.set_status(202);
        capture.headers_mut().set("X-Late", "ignored");

        assert_eq!(capture.headers().get("x-late"), None);
        let parts = capture.into_parts();
        assert_eq!(parts.headers.get("content-type"), Some("text/plain"));
        assert!(!parts.headers.contains("x-late"));
    }

    #[test]
    fn capture_is_object_safe() {
        let mut capture = BufferedCapture::new();
        let dyn_capture: &mut dyn ResponseCapture = &mut capture;
        dyn_capture.set_status(204);
        assert!(capture.is_committed());
    }
}
