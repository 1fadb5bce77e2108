use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::{Method, Uri, Version};

use crate::Error;
use crate::body::{ByteStream, ChunkedBytesStream, DEFAULT_CHUNK_SIZE, EmptyStream, ErrorStream};
use crate::header::HeaderMap;

/// Parse an `HTTP/major.minor` protocol string.
///
/// Only single-digit versions are recognised; anything else (including
/// `HTTP/2` without a minor) yields `None`.
pub fn parse_http_version(proto: &str) -> Option<(u8, u8)> {
    match proto {
        "HTTP/1.1" => return Some((1, 1)),
        "HTTP/1.0" => return Some((1, 0)),
        _ => {}
    }
    let rest = proto.strip_prefix("HTTP/")?.as_bytes();
    match rest {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            Some((major - b'0', minor - b'0'))
        }
        _ => None,
    }
}

#[derive(Debug, Clone)]
enum RequestBody {
    Empty,
    Full(Bytes),
    Invalid(Error),
}

/// The platform-agnostic request a handler sees.
///
/// Built once per invocation by a shape converter. The URI keeps the
/// event's path and query exactly as sent, dot segments included. The body
/// is decoded from the event up front; an event body that is not valid
/// base64 does not fail conversion but surfaces as an error when the body
/// is read.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    proto: String,
    version: Option<(u8, u8)>,
    headers: HeaderMap,
    remote_addr: String,
    body: RequestBody,
}

impl Request {
    /// Create a request with no body and no protocol information.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            proto: String::new(),
            version: None,
            headers,
            remote_addr: String::new(),
            body: RequestBody::Empty,
        }
    }

    /// Record the protocol string; major/minor stay unset if it is malformed.
    pub fn with_protocol(mut self, proto: impl Into<String>) -> Self {
        self.proto = proto.into();
        self.version = parse_http_version(&self.proto);
        self
    }

    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = remote_addr.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.body = if body.is_empty() {
            RequestBody::Empty
        } else {
            RequestBody::Full(body)
        };
        self
    }

    /// Attach an event body, decoding it first when the event flags it as
    /// base64.
    pub fn with_event_body(self, body: &str, is_base64: bool) -> Self {
        if body.is_empty() {
            return self;
        }
        if !is_base64 {
            return self.with_body(Bytes::copy_from_slice(body.as_bytes()));
        }
        match STANDARD.decode(body) {
            Ok(decoded) => self.with_body(decoded),
            Err(e) => Self {
                body: RequestBody::Invalid(Error::new(format!("invalid base64 body: {e}"))),
                ..self
            },
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The absolute `https://{domain}{path}{?query}` URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path plus query, as it would appear on an HTTP request line.
    pub fn request_uri(&self) -> &str {
        self.uri.path_and_query().map_or("/", |pq| pq.as_str())
    }

    pub fn host(&self) -> Option<&str> {
        self.uri.host()
    }

    pub fn proto(&self) -> &str {
        &self.proto
    }

    pub fn proto_version(&self) -> Option<(u8, u8)> {
        self.version
    }

    /// The protocol as an `http::Version`, defaulting to HTTP/1.1.
    pub fn http_version(&self) -> Version {
        match self.version {
            Some((0, 9)) => Version::HTTP_09,
            Some((1, 0)) => Version::HTTP_10,
            Some((2, _)) => Version::HTTP_2,
            Some((3, _)) => Version::HTTP_3,
            _ => Version::HTTP_11,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// `{source ip}:http`.
    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    pub fn has_body(&self) -> bool {
        !matches!(self.body, RequestBody::Empty)
    }

    /// The whole body. Empty when the event carried none.
    pub fn body(&self) -> Result<Bytes, Error> {
        match &self.body {
            RequestBody::Empty => Ok(Bytes::new()),
            RequestBody::Full(bytes) => Ok(bytes.clone()),
            RequestBody::Invalid(e) => Err(e.clone()),
        }
    }

    /// Consume the body as a stream of byte chunks of [`DEFAULT_CHUNK_SIZE`].
    pub fn body_stream(&self) -> ByteStream {
        self.body_stream_chunked(DEFAULT_CHUNK_SIZE)
    }

    /// Like [`body_stream()`](Request::body_stream) but with a custom chunk size.
    pub fn body_stream_chunked(&self, chunk_size: usize) -> ByteStream {
        match &self.body {
            RequestBody::Empty => Box::pin(EmptyStream),
            RequestBody::Full(bytes) => Box::pin(ChunkedBytesStream::new(bytes.clone(), chunk_size)),
            RequestBody::Invalid(e) => Box::pin(ErrorStream(Some(e.clone()))),
        }
    }
}
