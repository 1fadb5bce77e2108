//! lambda-bridge-tower: run a `tower::Service` as a lambda-bridge handler.
//!
//! [`ServiceHandler`] turns the canonical request into an
//! `http::Request<Full<Bytes>>`, calls the service, and copies the response
//! into the capture: headers, then status, then each body data frame as it
//! arrives. Services built with axum, or any other `http`-based tower stack,
//! can therefore serve every invocation shape, including streaming ones.
//!
//! The invocation [`Context`] is inserted into the request extensions so
//! services can reach the source event.

use bytes::Bytes;
use futures_core::future::BoxFuture;
use http_body::Body;
use http_body_util::{BodyExt, Full};
use lambda_bridge::{Context, Handler};
use lambda_bridge_http::{DEFAULT_STATUS, Request, ResponseCapture};
use tower::{BoxError, Service, ServiceExt};
use tracing::debug;

pub struct ServiceHandler<S> {
    service: S,
}

impl<S> ServiceHandler<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

fn boxed(e: impl Into<BoxError>) -> anyhow::Error {
    let e: BoxError = e.into();
    anyhow::anyhow!(e)
}

/// Build the `http::Request` a service expects from a canonical request.
pub fn to_http_request(ctx: Context, request: &Request) -> anyhow::Result<http::Request<Full<Bytes>>> {
    let body = request.body()?;
    let mut builder = http::Request::builder()
        .method(request.method().clone())
        .uri(request.uri().clone())
        .version(request.http_version())
        .extension(ctx);

    for header in request.headers().iter() {
        builder = builder.header(header.name.as_str(), header.value.as_str());
    }
    if !request.headers().contains("host") {
        if let Some(host) = request.host() {
            builder = builder.header(http::header::HOST, host);
        }
    }

    builder.body(Full::new(body)).map_err(anyhow::Error::from)
}

/// Copy an `http::Response` into a capture, forwarding body frames as they
/// arrive. Trailers are dropped.
pub async fn write_response<B>(response: http::Response<B>, capture: &mut dyn ResponseCapture) -> anyhow::Result<()>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let (parts, body) = response.into_parts();
    for (name, value) in &parts.headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        capture.headers_mut().append(name.as_str(), value.as_ref());
    }
    // A 200 is left to the first write, so a streamed envelope still gets
    // its Content-Type inferred from the body.
    let status = parts.status.as_u16();
    if status != DEFAULT_STATUS {
        capture.set_status(status);
    }

    let mut body = std::pin::pin!(body);
    loop {
        // Bound before the write so no `B::Error` is held across an await.
        let frame = match body.frame().await {
            Some(frame) => frame.map_err(boxed)?,
            None => return Ok(()),
        };
        if let Ok(data) = frame.into_data() {
            if !data.is_empty() {
                capture.write(data).await?;
            }
        }
    }
}

impl<S, B> Handler for ServiceHandler<S>
where
    S: Service<http::Request<Full<Bytes>>, Response = http::Response<B>> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    fn handle<'a>(
        &'a self,
        ctx: Context,
        request: Request,
        response: &'a mut dyn ResponseCapture,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let http_request = to_http_request(ctx, &request)?;
            debug!(method = %http_request.method(), uri = %http_request.uri(), "calling service");
            let http_response = self.service.clone().oneshot(http_request).await.map_err(boxed)?;
            write_response(http_response, response).await
        })
    }
}
