//! Shape finalizers: captured response -> wire response.
//!
//! Every finalizer runs the same steps, in order:
//!
//! 1. add `Content-Type` sniffed from the body unless the handler set one,
//! 2. add `Content-Length` unless the handler set one,
//! 3. emit the body as text if it is valid UTF-8, else as base64,
//! 4. fold headers into the shape's header map(s),
//! 5. move `Set-Cookie` values into the cookie list if the shape has one.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lambda_bridge_core::BridgeConfig;
use lambda_bridge_core::events::{FunctionUrlResponse, HttpV2Response, RestV1Response};
use lambda_bridge_http::{BufferedParts, HeaderMap, sniff};

/// Knobs shared by all finalizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeOptions {
    pub sniff_content_type: bool,
}

impl Default for FinalizeOptions {
    fn default() -> Self {
        Self {
            sniff_content_type: true,
        }
    }
}

impl From<&BridgeConfig> for FinalizeOptions {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            sniff_content_type: config.response.sniff_content_type,
        }
    }
}

/// How multi-valued headers are represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MultiValue {
    /// Single values go to `headers`, multiple values to `multiValueHeaders`.
    Split,
    /// All values of a name joined with `,` into `headers`.
    Join,
}

#[derive(Debug, Default)]
struct WireHeaders {
    headers: HashMap<String, String>,
    multi_value_headers: HashMap<String, Vec<String>>,
    cookies: Vec<String>,
}

fn fold_headers(headers: &HeaderMap, multi: MultiValue, extract_cookies: bool) -> WireHeaders {
    let mut wire = WireHeaders::default();
    for (name, mut values) in headers.grouped() {
        if extract_cookies && name.eq_ignore_ascii_case("set-cookie") {
            wire.cookies.append(&mut values);
            continue;
        }
        if values.len() == 1 {
            wire.headers.insert(name, values.remove(0));
            continue;
        }
        match multi {
            MultiValue::Split => {
                wire.multi_value_headers.insert(name, values);
            }
            MultiValue::Join => {
                wire.headers.insert(name, values.join(","));
            }
        }
    }
    wire
}

/// Steps 1 and 2: add inferred entity headers to `headers`.
fn infer_entity_headers(headers: &mut HeaderMap, body: &[u8], options: FinalizeOptions) {
    if options.sniff_content_type && !headers.contains("content-type") {
        headers.set("Content-Type", sniff::detect_content_type(body));
    }
    if !headers.contains("content-length") {
        headers.set("Content-Length", body.len().to_string());
    }
}

/// Step 3: the body as wire text plus the base64 flag.
pub fn encode_body(body: &[u8]) -> (String, bool) {
    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), false),
        Err(_) => (STANDARD.encode(body), true),
    }
}

/// Inverse of [`encode_body`].
pub fn decode_body(body: &str, is_base64: bool) -> Result<Vec<u8>, base64::DecodeError> {
    if is_base64 {
        STANDARD.decode(body)
    } else {
        Ok(body.as_bytes().to_vec())
    }
}

struct Finalized {
    status: u16,
    wire: WireHeaders,
    body: String,
    is_base64: bool,
}

fn finalize_parts(
    parts: BufferedParts,
    options: FinalizeOptions,
    multi: MultiValue,
    extract_cookies: bool,
) -> Finalized {
    let BufferedParts {
        status,
        mut headers,
        body,
    } = parts;
    infer_entity_headers(&mut headers, &body, options);
    let (body, is_base64) = encode_body(&body);
    Finalized {
        status,
        wire: fold_headers(&headers, multi, extract_cookies),
        body,
        is_base64,
    }
}

/// REST shape: no cookie channel, so `Set-Cookie` stays a header.
pub fn rest_v1(parts: BufferedParts, options: FinalizeOptions) -> RestV1Response {
    let f = finalize_parts(parts, options, MultiValue::Split, false);
    RestV1Response {
        status_code: f.status,
        headers: f.wire.headers,
        multi_value_headers: f.wire.multi_value_headers,
        body: f.body,
        is_base64_encoded: f.is_base64,
    }
}

pub fn http_v2(parts: BufferedParts, options: FinalizeOptions) -> HttpV2Response {
    let f = finalize_parts(parts, options, MultiValue::Split, true);
    HttpV2Response {
        status_code: f.status,
        headers: f.wire.headers,
        multi_value_headers: f.wire.multi_value_headers,
        body: f.body,
        is_base64_encoded: f.is_base64,
        cookies: f.wire.cookies,
    }
}

pub fn function_url(parts: BufferedParts, options: FinalizeOptions) -> FunctionUrlResponse {
    let f = finalize_parts(parts, options, MultiValue::Join, true);
    FunctionUrlResponse {
        status_code: f.status,
        headers: f.wire.headers,
        body: f.body,
        is_base64_encoded: f.is_base64,
        cookies: f.wire.cookies,
    }
}

/// The header snapshot a streaming response commits with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub cookies: Vec<String>,
}

/// Build a streaming envelope. `first_chunk` is the body prefix known at
/// commit time, if any, used for Content-Type inference; the length of a
/// streamed body is unknown, so Content-Length is only added when
/// `complete_body` says the body is already whole.
pub fn streaming_envelope(
    status: u16,
    mut headers: HeaderMap,
    first_chunk: Option<&[u8]>,
    complete_body: bool,
    options: FinalizeOptions,
) -> Envelope {
    if complete_body {
        infer_entity_headers(&mut headers, first_chunk.unwrap_or_default(), options);
    } else if let Some(chunk) = first_chunk {
        if options.sniff_content_type && !headers.contains("content-type") {
            headers.set("Content-Type", sniff::detect_content_type(chunk));
        }
    }
    let wire = fold_headers(&headers, MultiValue::Join, true);
    Envelope {
        status,
        headers: wire.headers,
        cookies: wire.cookies,
    }
}
