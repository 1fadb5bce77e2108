//! Streaming coordinator behavior as seen by the consumer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures_core::future::BoxFuture;
use futures_util::StreamExt;
use lambda_bridge::{
    BridgeConfig, Context, Handler, Invoke, InvokeError, Request, ResponseCapture,
    function_url_streaming_handler,
};
use lambda_bridge_core::events::{FunctionUrlRequest, FunctionUrlRequestContext};

fn event() -> FunctionUrlRequest {
    FunctionUrlRequest {
        raw_path: "/stream".into(),
        request_context: FunctionUrlRequestContext {
            domain_name: "x.lambda-url.example".into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Writes "a", "b", "c" with a pause before each of the later chunks.
#[derive(Default)]
struct SlowWriter {
    done: AtomicBool,
}

impl Handler for SlowWriter {
    fn handle<'a>(
        &'a self,
        _ctx: Context,
        _request: Request,
        response: &'a mut dyn ResponseCapture,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            response.headers_mut().set("Content-Type", "text/plain");
            for (i, chunk) in ["a", "b", "c"].into_iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                response.write(Bytes::from(chunk)).await?;
            }
            self.done.store(true, Ordering::SeqCst);
            Ok(())
        })
    }
}

#[tokio::test(start_paused = true)]
async fn envelope_arrives_before_the_body() {
    let handler = Arc::new(SlowWriter::default());
    let driver = function_url_streaming_handler(handler.clone(), &BridgeConfig::default());

    let mut response = driver.invoke(&Context::new(), event()).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.headers["Content-Type"], "text/plain");
    assert!(!handler.done.load(Ordering::SeqCst), "envelope waited for the whole body");

    let mut chunks = Vec::new();
    while let Some(chunk) = response.body.next().await {
        chunks.push(chunk.unwrap());
    }
    assert_eq!(chunks, ["a", "b", "c"]);
    assert!(handler.done.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn collected_body_is_the_concatenation() {
    let driver = function_url_streaming_handler(Arc::new(SlowWriter::default()), &BridgeConfig::default());
    let response = driver.invoke(&Context::new(), event()).await.unwrap();
    assert_eq!(response.collect_body().await.unwrap().as_ref(), b"abc");
}

/// Never writes; waits for cancellation.
struct Idle;

impl Handler for Idle {
    fn handle<'a>(
        &'a self,
        ctx: Context,
        _request: Request,
        _response: &'a mut dyn ResponseCapture,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            ctx.cancelled().await;
            Ok(())
        })
    }
}

#[tokio::test]
async fn cancellation_before_commit_resolves_promptly() {
    let driver = function_url_streaming_handler(Arc::new(Idle), &BridgeConfig::default());
    let ctx = Context::new();

    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(2), driver.invoke(&ctx, event()))
        .await
        .expect("cancelled invocation hung");
    assert!(matches!(result, Err(InvokeError::Cancelled)));
}

/// Commits a 202 as soon as its context is cancelled.
struct CommitOnCancel;

impl Handler for CommitOnCancel {
    fn handle<'a>(
        &'a self,
        ctx: Context,
        _request: Request,
        response: &'a mut dyn ResponseCapture,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            ctx.cancelled().await;
            response.set_status(202);
            Ok(())
        })
    }
}

#[tokio::test]
async fn commit_caused_by_cancellation_does_not_win() {
    let driver = function_url_streaming_handler(Arc::new(CommitOnCancel), &BridgeConfig::default());
    let ctx = Context::new();

    let invocation = driver.invoke(&ctx, event());
    tokio::pin!(invocation);
    // Let the handler task start and park on its context.
    assert!(futures_util::poll!(invocation.as_mut()).is_pending());
    tokio::task::yield_now().await;

    ctx.cancel();
    // The handler task runs first and commits before the invocation is
    // polled again.
    tokio::task::yield_now().await;

    assert!(matches!(invocation.await, Err(InvokeError::Cancelled)));
}

#[tokio::test]
async fn already_cancelled_context_wins_over_commit() {
    let driver = function_url_streaming_handler(Arc::new(SlowWriter::default()), &BridgeConfig::default());
    let ctx = Context::new();
    ctx.cancel();

    let result = driver.invoke(&ctx, event()).await;
    assert!(matches!(result, Err(InvokeError::Cancelled)));
}

struct FailEarly;

impl Handler for FailEarly {
    fn handle<'a>(
        &'a self,
        _ctx: Context,
        _request: Request,
        response: &'a mut dyn ResponseCapture,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            response.headers_mut().set("X-Partial", "1");
            anyhow::bail!("upstream refused")
        })
    }
}

#[tokio::test]
async fn error_before_commit_is_an_invocation_error() {
    let driver = function_url_streaming_handler(Arc::new(FailEarly), &BridgeConfig::default());
    let err = driver.invoke(&Context::new(), event()).await.unwrap_err();
    assert!(matches!(err, InvokeError::Handler(_)));
    assert_eq!(err.to_string(), "upstream refused");
}

struct FailLate;

impl Handler for FailLate {
    fn handle<'a>(
        &'a self,
        _ctx: Context,
        _request: Request,
        response: &'a mut dyn ResponseCapture,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            response.write(Bytes::from_static(b"partial")).await?;
            anyhow::bail!("connection reset")
        })
    }
}

#[tokio::test]
async fn error_after_commit_terminates_the_body() {
    let driver = function_url_streaming_handler(Arc::new(FailLate), &BridgeConfig::default());
    let mut response = driver.invoke(&Context::new(), event()).await.unwrap();
    assert_eq!(response.status, 200);

    assert_eq!(response.body.next().await.unwrap().unwrap().as_ref(), b"partial");
    let err = response.body.next().await.unwrap().unwrap_err();
    assert_eq!(err.message(), "connection reset");
    assert!(response.body.next().await.is_none());
}

struct Silent;

impl Handler for Silent {
    fn handle<'a>(
        &'a self,
        _ctx: Context,
        _request: Request,
        response: &'a mut dyn ResponseCapture,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            response.headers_mut().append("Set-Cookie", "seen=1");
            Ok(())
        })
    }
}

#[tokio::test]
async fn no_write_still_commits_default_envelope() {
    let driver = function_url_streaming_handler(Arc::new(Silent), &BridgeConfig::default());
    let response = driver.invoke(&Context::new(), event()).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.headers["Content-Type"], "text/plain; charset=utf-8");
    assert_eq!(response.headers["Content-Length"], "0");
    assert_eq!(response.cookies, vec!["seen=1"]);
    assert!(response.collect_body().await.unwrap().is_empty());
}

/// Counts completed writes of four chunks.
#[derive(Default)]
struct Counter {
    written: AtomicUsize,
}

impl Handler for Counter {
    fn handle<'a>(
        &'a self,
        _ctx: Context,
        _request: Request,
        response: &'a mut dyn ResponseCapture,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            for chunk in ["1", "2", "3", "4"] {
                response.write(Bytes::from(chunk)).await?;
                self.written.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        })
    }
}

#[tokio::test(start_paused = true)]
async fn slow_consumer_throttles_the_handler() {
    let handler = Arc::new(Counter::default());
    let driver = function_url_streaming_handler(handler.clone(), &BridgeConfig::default());
    let response = driver.invoke(&Context::new(), event()).await.unwrap();

    // One chunk fits in the pipe; the next write waits for the consumer.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handler.written.load(Ordering::SeqCst), 1);

    assert_eq!(response.collect_body().await.unwrap().as_ref(), b"1234");
    assert_eq!(handler.written.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn dropped_body_fails_the_next_write() {
    let handler = Arc::new(Counter::default());
    let driver = function_url_streaming_handler(handler.clone(), &BridgeConfig::default());
    let response = driver.invoke(&Context::new(), event()).await.unwrap();
    drop(response);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(handler.written.load(Ordering::SeqCst), 1);
}
