//! Shape converters: invocation event -> canonical [`Request`].
//!
//! All shapes build the URL as `https://{domain}{path}{?query}` and the
//! remote address as `{source ip}:http`. They differ in where the path,
//! query and headers live in the event, and in how multi-valued headers
//! are encoded.

use std::collections::HashMap;

use http::{Method, Uri};
use lambda_bridge_core::events::{FunctionUrlRequest, HttpDescription, HttpV2Request, RestV1Request};
use lambda_bridge_http::{HeaderMap, Request};
use tracing::debug;
use url::form_urlencoded;

use crate::error::ConversionError;

/// Parse the event's method. An empty method means `GET`.
fn parse_method(method: &str) -> Result<Method, ConversionError> {
    if method.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(method.as_bytes())
        .map_err(|_| ConversionError::InvalidMethod(method.to_string()))
}

/// Use `raw` if present, otherwise form-encode `params` (keys sorted).
pub(crate) fn build_query<'a, I>(raw: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    if !raw.is_empty() {
        return raw.to_string();
    }
    let mut pairs: Vec<(&str, &str)> = params.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// `https://{domain}{path}{?query}`, taking `path` if non-empty, else
/// `alt_path`, and always starting the path with `/`.
///
/// Path and query are kept byte for byte: dot segments are not resolved,
/// so the handler routes on the path the client sent.
pub fn build_uri(domain: &str, path: &str, alt_path: &str, query: &str) -> Result<Uri, ConversionError> {
    let path = if path.is_empty() { alt_path } else { path };
    let slash = if path.starts_with('/') { "" } else { "/" };
    let mut raw = format!("https://{domain}{slash}{path}");
    if !query.is_empty() {
        raw.push('?');
        raw.push_str(query);
    }

    if domain.is_empty() {
        return Err(ConversionError::InvalidUrl {
            url: raw,
            reason: "missing domain name".into(),
        });
    }

    Uri::try_from(raw.as_str()).map_err(|e| ConversionError::InvalidUrl {
        reason: e.to_string(),
        url: raw,
    })
}

/// The event's domain name, or the `Host` header when the event has none.
fn authority<'a>(domain: &'a str, headers: &'a HeaderMap) -> &'a str {
    if !domain.is_empty() {
        return domain;
    }
    headers.get("host").unwrap_or_default()
}

fn sorted<V>(map: &HashMap<String, V>) -> Vec<(&String, &V)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Add single-valued event headers, optionally splitting comma-joined values.
/// Split parts keep their surrounding whitespace.
fn add_single_valued(headers: &mut HeaderMap, source: &HashMap<String, String>, split_comma_joined: bool) {
    for (name, value) in sorted(source) {
        if split_comma_joined {
            for part in value.split(',') {
                headers.append(name.as_str(), part);
            }
        } else {
            headers.append(name.as_str(), value.as_str());
        }
    }
}

fn add_cookies(headers: &mut HeaderMap, cookies: &[String]) {
    for cookie in cookies {
        headers.append("Cookie", cookie.as_str());
    }
}

pub fn rest_v1(event: &RestV1Request) -> Result<Request, ConversionError> {
    let query = if !event.multi_value_query_string_parameters.is_empty() {
        build_query(
            "",
            event
                .multi_value_query_string_parameters
                .iter()
                .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str()))),
        )
    } else {
        build_query(
            "",
            event
                .query_string_parameters
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
    };

    let ctx = &event.request_context;
    let method = parse_method(&event.http_method)?;

    let mut headers = HeaderMap::new();
    if !event.multi_value_headers.is_empty() {
        for (name, values) in sorted(&event.multi_value_headers) {
            for value in values {
                headers.append(name.as_str(), value.as_str());
            }
        }
    } else {
        add_single_valued(&mut headers, &event.headers, false);
    }
    let uri = build_uri(authority(&ctx.domain_name, &headers), &event.path, &ctx.path, &query)?;

    debug!(shape = "rest-v1", %method, %uri, "converted event");

    Ok(Request::new(method, uri, headers)
        .with_protocol(ctx.protocol.as_str())
        .with_remote_addr(format!("{}:http", ctx.identity.source_ip))
        .with_event_body(&event.body, event.is_base64_encoded))
}

/// The fields the v2 and function URL payloads have in common.
struct V2Fields<'a> {
    shape: &'static str,
    domain: &'a str,
    raw_path: &'a str,
    raw_query: &'a str,
    query_params: &'a HashMap<String, String>,
    http: &'a HttpDescription,
    cookies: &'a [String],
    headers: &'a HashMap<String, String>,
    body: &'a str,
    is_base64: bool,
}

fn convert_v2_fields(fields: V2Fields<'_>, split_comma_joined: bool) -> Result<Request, ConversionError> {
    let query = build_query(
        fields.raw_query,
        fields.query_params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    );
    let method = parse_method(&fields.http.method)?;

    let mut headers = HeaderMap::new();
    add_cookies(&mut headers, fields.cookies);
    add_single_valued(&mut headers, fields.headers, split_comma_joined);
    let uri = build_uri(
        authority(fields.domain, &headers),
        fields.raw_path,
        &fields.http.path,
        &query,
    )?;

    debug!(shape = fields.shape, %method, %uri, "converted event");

    Ok(Request::new(method, uri, headers)
        .with_protocol(fields.http.protocol.as_str())
        .with_remote_addr(format!("{}:http", fields.http.source_ip))
        .with_event_body(fields.body, fields.is_base64))
}

pub fn http_v2(event: &HttpV2Request, split_comma_joined: bool) -> Result<Request, ConversionError> {
    let fields = V2Fields {
        shape: "http-v2",
        domain: &event.request_context.domain_name,
        raw_path: &event.raw_path,
        raw_query: &event.raw_query_string,
        query_params: &event.query_string_parameters,
        http: &event.request_context.http,
        cookies: &event.cookies,
        headers: &event.headers,
        body: &event.body,
        is_base64: event.is_base64_encoded,
    };
    convert_v2_fields(fields, split_comma_joined)
}

/// Used by both the buffered and the streaming function URL drivers.
pub fn function_url(event: &FunctionUrlRequest, split_comma_joined: bool) -> Result<Request, ConversionError> {
    let fields = V2Fields {
        shape: "function-url",
        domain: &event.request_context.domain_name,
        raw_path: &event.raw_path,
        raw_query: &event.raw_query_string,
        query_params: &event.query_string_parameters,
        http: &event.request_context.http,
        cookies: &event.cookies,
        headers: &event.headers,
        body: &event.body,
        is_base64: event.is_base64_encoded,
    };
    convert_v2_fields(fields, split_comma_joined)
}
