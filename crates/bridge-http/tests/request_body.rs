use bytes::Bytes;
use futures_util::StreamExt;
use http::{Method, Uri};
use lambda_bridge_http::{DEFAULT_CHUNK_SIZE, HeaderMap, Request};

fn request() -> Request {
    Request::new(
        Method::POST,
        Uri::from_static("https://upload.example/files"),
        HeaderMap::new(),
    )
}

#[tokio::test]
async fn large_event_body_streams_in_default_chunks() {
    let payload = vec![b'x'; DEFAULT_CHUNK_SIZE * 2 + 10];
    let req = request().with_body(Bytes::from(payload.clone()));

    let sizes: Vec<usize> = req
        .body_stream()
        .map(|chunk| chunk.unwrap().len())
        .collect()
        .await;
    assert_eq!(sizes, [DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_SIZE, 10]);
    assert_eq!(req.body().unwrap().as_ref(), payload.as_slice());
}

#[tokio::test]
async fn base64_event_body_is_decoded_before_streaming() {
    let req = request().with_event_body("aGVsbG8=", true);
    let mut stream = req.body_stream_chunked(2);

    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        collected.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(collected, b"hello");
}

#[tokio::test]
async fn undecodable_body_yields_one_error() {
    let req = request().with_event_body("not*base64", true);
    assert!(req.has_body());
    assert!(req.body().is_err());

    let items: Vec<_> = req.body_stream().collect().await;
    assert_eq!(items.len(), 1);
    assert!(items[0].as_ref().unwrap_err().message().starts_with("invalid base64 body"));
}

#[tokio::test]
async fn missing_body_is_an_empty_stream() {
    let req = request();
    assert!(!req.has_body());
    assert_eq!(req.body_stream().count().await, 0);
}
