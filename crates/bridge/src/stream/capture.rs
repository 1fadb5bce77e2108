use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_core::future::BoxFuture;
use lambda_bridge_http::{Committed, DEFAULT_STATUS, Error, HeaderMap, ResponseCapture};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{Fault, panic_message};
use crate::finalize::{self, Envelope, FinalizeOptions};

type Chunk = Result<Bytes, Error>;

/// What the handler task reports to the waiting invocation, exactly once.
pub(crate) enum Outcome {
    Committed(StreamingResponse),
    Failed(anyhow::Error),
    Faulted(Fault),
}

/// How the handler finished.
pub(crate) enum Completion {
    Returned,
    Failed(anyhow::Error),
    Faulted(Fault),
}

/// The response body as it is written by the handler.
///
/// Ends when the handler returns. If the handler fails after the envelope
/// was delivered, the last item is an error.
#[derive(Debug)]
pub struct BodyStream {
    rx: mpsc::Receiver<Chunk>,
}

impl BodyStream {
    /// The next chunk, or `None` once the handler has finished.
    pub async fn next_chunk(&mut self) -> Option<Chunk> {
        self.rx.recv().await
    }
}

impl Stream for BodyStream {
    type Item = Chunk;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Chunk>> {
        self.rx.poll_recv(cx)
    }
}

/// A committed streaming response: the envelope plus the live body.
#[derive(Debug)]
pub struct StreamingResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub cookies: Vec<String>,
    pub body: BodyStream,
}

impl StreamingResponse {
    fn new(envelope: Envelope, body: BodyStream) -> Self {
        Self {
            status: envelope.status,
            headers: envelope.headers,
            cookies: envelope.cookies,
            body,
        }
    }

    /// Read the body to the end. Fails with the error that terminated the
    /// stream, if any.
    pub async fn collect_body(mut self) -> Result<Bytes, Error> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.body.next_chunk().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

/// Response capture that forwards body bytes to the consumer as written.
///
/// Owned by the handler task. Dropping it closes the write side of the
/// pipe, so the consumer always sees the end of the body.
pub struct StreamingCapture {
    headers: HeaderMap,
    committed: Option<Committed>,
    outcome: Option<oneshot::Sender<Outcome>>,
    body_tx: mpsc::Sender<Chunk>,
    body_rx: Option<mpsc::Receiver<Chunk>>,
    options: FinalizeOptions,
}

impl StreamingCapture {
    pub(crate) fn new(outcome: oneshot::Sender<Outcome>, pipe_capacity: usize, options: FinalizeOptions) -> Self {
        let (body_tx, body_rx) = mpsc::channel(pipe_capacity.max(1));
        Self {
            headers: HeaderMap::new(),
            committed: None,
            outcome: Some(outcome),
            body_tx,
            body_rx: Some(body_rx),
            options,
        }
    }

    /// Freeze status and headers and hand the envelope to the invocation.
    fn commit(&mut self, status: u16, first_chunk: Option<&[u8]>, complete_body: bool) {
        if self.committed.is_some() {
            return;
        }
        let headers = self.headers.clone();
        let envelope = finalize::streaming_envelope(status, headers.clone(), first_chunk, complete_body, self.options);
        self.committed = Some(Committed { status, headers });

        let (Some(outcome), Some(body_rx)) = (self.outcome.take(), self.body_rx.take()) else {
            return;
        };
        debug!(status, "streaming response committed");
        let response = StreamingResponse::new(envelope, BodyStream { rx: body_rx });
        if outcome.send(Outcome::Committed(response)).is_err() {
            debug!("streaming invocation gone before commit");
        }
    }

    fn report(&mut self, outcome: Outcome) {
        if let Some(tx) = self.outcome.take() {
            let _ = tx.send(outcome);
        }
    }

    /// Finish the response after the handler returned, failed or panicked.
    pub(crate) async fn close(mut self, completion: Completion) {
        let Some(committed) = self.committed.take() else {
            match completion {
                // Nothing written: commit the default status with the
                // headers of an empty body.
                Completion::Returned => self.commit(DEFAULT_STATUS, None, true),
                Completion::Failed(e) => self.report(Outcome::Failed(e)),
                Completion::Faulted(fault) => self.report(Outcome::Faulted(fault)),
            }
            return;
        };

        if committed.headers != self.headers {
            warn!("header changes after commit ignored");
        }
        let message = match completion {
            Completion::Returned => return,
            Completion::Failed(e) => {
                warn!(error = %e, "handler failed after commit");
                e.to_string()
            }
            Completion::Faulted(fault) => {
                let message = panic_message(&fault).unwrap_or("<non-string panic payload>");
                warn!(fault = message, "handler panicked after commit");
                format!("handler panicked: {message}")
            }
        };
        // A consumer that already dropped the body has nothing to notify.
        let _ = self.body_tx.send(Err(Error::new(message))).await;
    }
}

impl ResponseCapture for StreamingCapture {
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
        match &self.committed {
            Some(committed) if committed.status != status => {
                warn!(status, committed = committed.status, "status change after commit ignored");
            }
            Some(_) => {}
            None => self.commit(status, None, false),
        }
    }

    fn write(&mut self, chunk: Bytes) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            if self.committed.is_none() {
                self.commit(DEFAULT_STATUS, Some(&chunk), false);
            }
            if chunk.is_empty() {
                return Ok(());
            }
            self.body_tx.send(Ok(chunk)).await.map_err(|_| Error::closed())
        })
    }

    fn is_committed(&self) -> bool {
        self.committed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context as LayerContext, Layer, SubscriberExt};

    use super::*;

    /// Collects the messages of `WARN` events.
    #[derive(Clone, Default)]
    struct Warnings(Arc<Mutex<Vec<String>>>);

    struct Message<'a>(&'a mut String);

    impl Visit for Message<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                *self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: Subscriber> Layer<S> for Warnings {
        fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                let mut message = String::new();
                event.record(&mut Message(&mut message));
                self.0.lock().unwrap().push(message);
            }
        }
    }

    fn capture() -> (StreamingCapture, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        (StreamingCapture::new(tx, 4, FinalizeOptions::default()), rx)
    }

    fn committed(outcome: Outcome) -> StreamingResponse {
        match outcome {
            Outcome::Committed(response) => response,
            Outcome::Failed(e) => panic!("unexpected failure: {e}"),
            Outcome::Faulted(_) => panic!("unexpected fault"),
        }
    }

    #[tokio::test]
    async fn first_write_commits_and_sniffs() {
        let (mut capture, rx) = capture();
        capture.headers_mut().append("Set-Cookie", "a=1");
        capture.write(Bytes::from_static(b"<html>")).await.unwrap();
        capture.set_status(500);
        assert_eq!(capture.status(), 200);

        let response = committed(rx.await.unwrap());
        assert_eq!(response.status, 200);
        assert_eq!(response.headers["Content-Type"], "text/html; charset=utf-8");
        assert!(!response.headers.contains_key("Content-Length"));
        assert_eq!(response.cookies, vec!["a=1"]);

        capture.close(Completion::Returned).await;
        assert_eq!(response.collect_body().await.unwrap().as_ref(), b"<html>");
    }

    #[tokio::test]
    async fn set_status_commits_without_inference() {
        let (mut capture, rx) = capture();
        capture.set_status(204);
        capture.headers_mut().set("X-Late", "1");
        assert!(capture.headers().get("x-late").is_none());

        let response = committed(rx.await.unwrap());
        assert_eq!(response.status, 204);
        assert!(response.headers.is_empty());
        capture.close(Completion::Returned).await;
        assert!(response.collect_body().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn returning_without_writes_commits_empty_body() {
        let (capture, rx) = capture();
        capture.close(Completion::Returned).await;

        let response = committed(rx.await.unwrap());
        assert_eq!(response.status, 200);
        assert_eq!(response.headers["Content-Length"], "0");
        assert_eq!(response.headers["Content-Type"], "text/plain; charset=utf-8");
        assert!(response.collect_body().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pre_commit_failure_is_reported() {
        let (capture, rx) = capture();
        capture.close(Completion::Failed(anyhow::anyhow!("nope"))).await;
        match rx.await.unwrap() {
            Outcome::Failed(e) => assert_eq!(e.to_string(), "nope"),
            _ => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn post_commit_failure_terminates_body() {
        let (mut capture, rx) = capture();
        capture.write(Bytes::from_static(b"partial")).await.unwrap();
        let response = committed(rx.await.unwrap());

        capture.close(Completion::Failed(anyhow::anyhow!("lost upstream"))).await;
        let err = response.collect_body().await.unwrap_err();
        assert_eq!(err.message(), "lost upstream");
    }

    #[tokio::test]
    async fn post_commit_fault_terminates_body() {
        let (mut capture, rx) = capture();
        capture.write(Bytes::from_static(b"x")).await.unwrap();
        let mut response = committed(rx.await.unwrap());

        capture.close(Completion::Faulted(Box::new("index out of bounds"))).await;
        assert_eq!(response.body.next_chunk().await.unwrap().unwrap().as_ref(), b"x");
        let err = response.body.next_chunk().await.unwrap().unwrap_err();
        assert_eq!(err.message(), "handler panicked: index out of bounds");
        assert!(response.body.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn dropped_changes_after_commit_are_warnings() {
        let warnings = Warnings::default();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(warnings.clone()));

        let (mut capture, rx) = capture();
        capture.write(Bytes::from_static(b"body")).await.unwrap();
        capture.set_status(404);
        capture.headers_mut().set("X-Late", "1");
        let response = committed(rx.await.unwrap());
        capture.close(Completion::Returned).await;

        assert_eq!(response.status, 200);
        assert_eq!(
            *warnings.0.lock().unwrap(),
            ["status change after commit ignored", "header changes after commit ignored"]
        );
    }

    #[tokio::test]
    async fn write_fails_once_consumer_is_gone() {
        let (mut capture, rx) = capture();
        capture.write(Bytes::from_static(b"first")).await.unwrap();
        drop(committed(rx.await.unwrap()));

        let err = capture.write(Bytes::from_static(b"second")).await.unwrap_err();
        assert_eq!(err, Error::closed());
    }
}
